//! Step registry
//!
//! Built once at startup. Construction rejects duplicate names, a missing
//! initial step, and fallback choices that lead nowhere.

use super::step::{Choice, StepId, StepKind};
use crate::presentation::Content;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Step registered twice: {0}")]
    DuplicateStep(StepId),
    #[error("Initial step is not registered: {0}")]
    MissingInitial(StepId),
    #[error("No fallback response configured")]
    MissingFallback,
    #[error("Fallback choice {label:?} has no target step")]
    FallbackWithoutTarget { label: String },
    #[error("Fallback choice {label:?} targets unknown step {target}")]
    UnknownFallbackTarget { label: String, target: StepId },
}

/// Response to input that no prompt or choice claims
#[derive(Debug, Clone)]
pub struct Fallback {
    pub message: Content,
    /// Each choice carries its own target
    pub choices: Vec<Choice>,
}

#[derive(Debug)]
pub struct StepRegistry {
    steps: HashMap<StepId, StepKind>,
    initial: StepId,
    fallback: Fallback,
}

impl StepRegistry {
    pub fn builder(initial: StepId) -> RegistryBuilder {
        RegistryBuilder {
            initial,
            steps: Vec::new(),
            fallback: None,
        }
    }

    pub fn get(&self, id: &StepId) -> Option<&StepKind> {
        self.steps.get(id)
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.steps.contains_key(id)
    }

    pub fn initial(&self) -> &StepId {
        &self.initial
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct RegistryBuilder {
    initial: StepId,
    steps: Vec<(StepId, StepKind)>,
    fallback: Option<Fallback>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn step(mut self, id: StepId, kind: StepKind) -> Self {
        self.steps.push((id, kind));
        self
    }

    #[must_use]
    pub fn fallback(mut self, message: impl Into<Content>, choices: Vec<Choice>) -> Self {
        self.fallback = Some(Fallback {
            message: message.into(),
            choices,
        });
        self
    }

    pub fn build(self) -> Result<StepRegistry, RegistryError> {
        let mut steps = HashMap::with_capacity(self.steps.len());
        for (id, kind) in self.steps {
            if steps.contains_key(&id) {
                return Err(RegistryError::DuplicateStep(id));
            }
            steps.insert(id, kind);
        }

        if !steps.contains_key(&self.initial) {
            return Err(RegistryError::MissingInitial(self.initial));
        }

        let fallback = self.fallback.ok_or(RegistryError::MissingFallback)?;
        for choice in &fallback.choices {
            let Some(target) = &choice.next else {
                return Err(RegistryError::FallbackWithoutTarget {
                    label: choice.label.clone(),
                });
            };
            if !steps.contains_key(target) {
                return Err(RegistryError::UnknownFallbackTarget {
                    label: choice.label.clone(),
                    target: target.clone(),
                });
            }
        }

        tracing::debug!(steps = steps.len(), initial = %self.initial, "Step registry built");

        Ok(StepRegistry {
            steps,
            initial: self.initial,
            fallback,
        })
    }
}
