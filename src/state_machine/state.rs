//! Session state types

use super::step::{Choice, StepId};
use crate::presentation::{InputField, InputSurface};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const CHOICE_FIELD_LABEL: &str = "Choose an option";
const CHOICE_FIELD_PLACEHOLDER: &str = "Type an option shown above";
const CHOICE_HINT: &str = "Type the option text or tap a button.";
const DEFAULT_PROMPT_LABEL: &str = "Your response";

// ============================================================================
// Collected Answers
// ============================================================================

/// A validated answer and the step that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub value: String,
    pub owner: StepId,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("field {field} is owned by step {owner}, refusing write from {attempted_by}")]
pub struct AnswerConflict {
    pub field: &'static str,
    pub owner: StepId,
    pub attempted_by: StepId,
}

/// Answers collected so far, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<&'static str, Answer>);

impl Answers {
    /// Record a value. Only the step that first wrote a field may overwrite it.
    pub fn record(
        &mut self,
        owner: &StepId,
        field: &'static str,
        value: impl Into<String>,
    ) -> Result<(), AnswerConflict> {
        if let Some(existing) = self.0.get(field) {
            if &existing.owner != owner {
                return Err(AnswerConflict {
                    field,
                    owner: existing.owner.clone(),
                    attempted_by: owner.clone(),
                });
            }
        }
        self.0.insert(
            field,
            Answer {
                value: value.into(),
                owner: owner.clone(),
            },
        );
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|answer| answer.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// ============================================================================
// Prompt and Choices
// ============================================================================

/// Label, placeholder and hint for a free-text prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSpec {
    pub label: String,
    pub placeholder: String,
    pub hint: String,
}

impl PromptSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }
}

/// The open free-text prompt and the step that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePrompt {
    pub step: StepId,
    pub label: String,
    pub placeholder: String,
}

/// Who handles a selection from the offered set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "step", rename_all = "snake_case")]
pub enum ChoiceOwner {
    Step(StepId),
    /// Offered by the off-topic fallback; targets are followed directly
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceSet {
    pub owner: ChoiceOwner,
    pub choices: Vec<Choice>,
}

// ============================================================================
// Session
// ============================================================================

/// The single mutable record of one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    /// `None` until the initial step is committed
    pub current_step: Option<StepId>,
    pub answers: Answers,
    /// Which step, if any, currently owns the free-text field
    pub prompt: Option<ActivePrompt>,
    /// Replaced wholesale on every offer
    pub choices: Option<ChoiceSet>,
    /// Whether typed text is matched against the offered choices
    pub choice_typing: bool,
    pub hint: Option<String>,
    /// Bumped on every commit; scheduled entries carrying an older value are stale
    pub entry_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a free-text prompt owned by `step`; hides any offered choices
    pub fn open_prompt(&mut self, step: &StepId, spec: PromptSpec) {
        self.prompt = Some(ActivePrompt {
            step: step.clone(),
            label: if spec.label.is_empty() {
                DEFAULT_PROMPT_LABEL.to_string()
            } else {
                spec.label
            },
            placeholder: spec.placeholder,
        });
        self.hint = non_empty(spec.hint);
        self.offer(ChoiceOwner::Step(step.clone()), Vec::new());
    }

    /// Close the prompt. The hint survives only while typed choices need it.
    pub fn close_prompt(&mut self) {
        self.prompt = None;
        if !self.choice_typing {
            self.hint = None;
        }
    }

    /// Replace the offered choices. Typed matching is enabled only when no
    /// prompt owns the field.
    pub fn offer(&mut self, owner: ChoiceOwner, choices: Vec<Choice>) {
        if choices.is_empty() {
            self.choices = None;
            self.choice_typing = false;
            if self.prompt.is_none() {
                self.hint = None;
            }
            return;
        }

        self.choices = Some(ChoiceSet { owner, choices });
        if self.prompt.is_none() {
            self.choice_typing = true;
            self.hint = Some(CHOICE_HINT.to_string());
        }
    }

    pub fn withdraw_choices(&mut self) {
        self.choices = None;
        self.choice_typing = false;
        if self.prompt.is_none() {
            self.hint = None;
        }
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = non_empty(hint.into());
    }

    pub fn offered(&self) -> &[Choice] {
        self.choices.as_ref().map_or(&[], |set| set.choices.as_slice())
    }

    /// Derive what the input area should show
    pub fn input_surface(&self) -> InputSurface {
        let field = match (&self.prompt, self.choice_typing) {
            (Some(prompt), _) => Some(InputField {
                label: prompt.label.clone(),
                placeholder: prompt.placeholder.clone(),
            }),
            (None, true) => Some(InputField {
                label: CHOICE_FIELD_LABEL.to_string(),
                placeholder: CHOICE_FIELD_PLACEHOLDER.to_string(),
            }),
            (None, false) => None,
        };

        InputSurface {
            field,
            hint: self.hint.clone(),
            choices: self.offered().iter().map(|choice| choice.label.clone()).collect(),
        }
    }

    /// JSON view for logging
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
