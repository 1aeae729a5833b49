//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! steps are looked up in a [`StepRegistry`], handlers act through a
//! [`StepScope`], and everything observable leaves as an [`Effect`].

mod effect;
pub mod event;
pub mod registry;
mod router;
mod scope;
pub mod state;
pub mod step;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use registry::{Fallback, RegistryError, StepRegistry};
pub use router::{route, Route};
pub use scope::StepScope;
pub use state::{Answers, ChoiceOwner, PromptSpec, Session};
pub use step::{Choice, ChoiceStep, Decision, Step, StepId, StepKind, TextStep};
pub use transition::{echo_for, transition, DialogueContext, TransitionError, TransitionResult};
