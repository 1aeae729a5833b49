//! Effects produced by state transitions

use super::step::StepId;
use crate::presentation::PresentationItem;
use std::time::Duration;

/// Effects to be executed after a state transition commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append the user's submission to the transcript, before anything else
    EchoUser { text: String },

    /// Queue a bot bubble for reveal
    Present(PresentationItem),

    /// Run the step's entry behavior after `delay`
    ScheduleEntry {
        step: StepId,
        seq: u64,
        delay: Duration,
    },

    /// Redraw the input area from the committed session
    SyncInput,

    /// Put the cursor back in the text field
    FocusInput,
}

impl Effect {
    pub fn echo_user(text: impl Into<String>) -> Self {
        Effect::EchoUser { text: text.into() }
    }

    pub fn is_presentation(&self) -> bool {
        matches!(self, Effect::Present(_))
    }
}
