//! Input routing
//!
//! Decides who handles a submission: a typed choice match, the step that
//! owns the open prompt, or the off-topic fallback.

use super::registry::StepRegistry;
use super::state::Session;
use super::step::StepId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Blank input; no echo, no state change
    Ignore,
    /// Same as clicking the offered choice at this index
    Choice(usize),
    /// Free text for the step owning the prompt
    Text(StepId),
    Fallback,
}

pub fn route(session: &Session, registry: &StepRegistry, raw: &str) -> Route {
    let text = raw.trim();
    if text.is_empty() {
        return Route::Ignore;
    }

    if session.prompt.is_none() && session.choice_typing {
        if let Some(index) = session.offered().iter().position(|choice| choice.matches(text)) {
            return Route::Choice(index);
        }
    }

    if let Some(prompt) = &session.prompt {
        if registry.get(&prompt.step).is_some_and(|kind| kind.accepts_text()) {
            return Route::Text(prompt.step.clone());
        }
    }

    Route::Fallback
}
