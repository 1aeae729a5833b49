//! Step definitions
//!
//! A step is registered as exactly one [`StepKind`]; the kind fixes which
//! handlers exist, so dispatch is an exhaustive match rather than a runtime
//! "is this handler defined" probe.

use super::scope::StepScope;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Unique name of a step in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(Cow<'static, str>);

impl StepId {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An option the user can click or type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Display text, also the default typed-match key
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<StepId>,
}

impl Choice {
    /// A choice handed to the step's selection handler
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            next: None,
        }
    }

    /// A choice that advances straight to `next`
    pub fn goto(label: impl Into<String>, next: StepId) -> Self {
        Self {
            label: label.into(),
            value: None,
            next: Some(next),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Case-insensitive, trimmed comparison against label and value
    pub fn matches(&self, typed: &str) -> bool {
        let wanted = typed.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        std::iter::once(&self.label)
            .chain(self.value.as_ref())
            .any(|key| key.trim().to_lowercase() == wanted)
    }
}

/// What a handler wants the machine to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Reject and remain. Text steps keep the prompt open; choice steps are
    /// re-shown from scratch.
    Stay,
    /// Advance to the named step
    Next(StepId),
    /// Advance using the step's default (text steps) or the choice's target
    Default,
    /// Show a message and keep the offered choices untouched. Text steps
    /// treat this like `Stay`.
    Error(String),
}

/// Behavior shared by every step
pub trait Step: Send + Sync {
    /// Sole side-effecting entry point: say things, open a prompt, offer choices
    fn on_enter(&self, scope: &mut StepScope<'_>);
}

/// A step that owns the free-text field while its prompt is open
pub trait TextStep: Step {
    /// Normalize and validate the raw submission
    fn on_input(&self, raw: &str, scope: &mut StepScope<'_>) -> Decision;

    /// Target used when `on_input` returns [`Decision::Default`]
    fn default_next(&self) -> Option<StepId> {
        None
    }
}

/// A step that validates the choice the user picked
pub trait ChoiceStep: Step {
    fn on_select(&self, choice: &Choice, scope: &mut StepScope<'_>) -> Decision;
}

/// A step with both handlers
pub trait HybridStep: TextStep + ChoiceStep {}

impl<T: TextStep + ChoiceStep> HybridStep for T {}

/// A registered step, tagged by the handlers it carries
pub enum StepKind {
    EntryOnly(Box<dyn Step>),
    TextPrompt(Box<dyn TextStep>),
    ChoicePrompt(Box<dyn ChoiceStep>),
    Hybrid(Box<dyn HybridStep>),
}

impl StepKind {
    pub fn entry(step: impl Step + 'static) -> Self {
        StepKind::EntryOnly(Box::new(step))
    }

    pub fn text(step: impl TextStep + 'static) -> Self {
        StepKind::TextPrompt(Box::new(step))
    }

    pub fn choice(step: impl ChoiceStep + 'static) -> Self {
        StepKind::ChoicePrompt(Box::new(step))
    }

    pub fn hybrid(step: impl HybridStep + 'static) -> Self {
        StepKind::Hybrid(Box::new(step))
    }

    pub fn on_enter(&self, scope: &mut StepScope<'_>) {
        match self {
            StepKind::EntryOnly(step) => step.on_enter(scope),
            StepKind::TextPrompt(step) => step.on_enter(scope),
            StepKind::ChoicePrompt(step) => step.on_enter(scope),
            StepKind::Hybrid(step) => step.on_enter(scope),
        }
    }

    pub fn accepts_text(&self) -> bool {
        matches!(self, StepKind::TextPrompt(_) | StepKind::Hybrid(_))
    }

    /// Run the text handler; `None` when the step has none
    pub fn handle_input(&self, raw: &str, scope: &mut StepScope<'_>) -> Option<Decision> {
        match self {
            StepKind::TextPrompt(step) => Some(step.on_input(raw, scope)),
            StepKind::Hybrid(step) => Some(step.on_input(raw, scope)),
            StepKind::EntryOnly(_) | StepKind::ChoicePrompt(_) => None,
        }
    }

    /// Run the selection handler; `None` when the step has none
    pub fn handle_selection(&self, choice: &Choice, scope: &mut StepScope<'_>) -> Option<Decision> {
        match self {
            StepKind::ChoicePrompt(step) => Some(step.on_select(choice, scope)),
            StepKind::Hybrid(step) => Some(step.on_select(choice, scope)),
            StepKind::EntryOnly(_) | StepKind::TextPrompt(_) => None,
        }
    }

    pub fn default_next(&self) -> Option<StepId> {
        match self {
            StepKind::TextPrompt(step) => step.default_next(),
            StepKind::Hybrid(step) => step.default_next(),
            StepKind::EntryOnly(_) | StepKind::ChoicePrompt(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StepKind::EntryOnly(_) => "entry_only",
            StepKind::TextPrompt(_) => "text_prompt",
            StepKind::ChoicePrompt(_) => "choice_prompt",
            StepKind::Hybrid(_) => "hybrid",
        }
    }
}

impl fmt::Debug for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}
