//! Events that can occur in a conversation

use super::step::StepId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Enter the initial step; sent once when the runtime starts
    Start,

    // User events
    UserSubmitted { text: String },
    ChoiceClicked { index: usize },

    /// A scheduled step entry came due
    EnterStep { step: StepId, seq: u64 },
}

impl Event {
    pub fn submitted(text: impl Into<String>) -> Self {
        Event::UserSubmitted { text: text.into() }
    }
}
