//! Pure state transition function
//!
//! Given the committed session, the immutable dialogue context and one
//! event, produce the next session and the effects the runtime must carry
//! out. A failed transition produces nothing: the caller keeps the old
//! session and runs none of the effects.

use super::effect::Effect;
use super::event::Event;
use super::registry::StepRegistry;
use super::router::{route, Route};
use super::scope::StepScope;
use super::state::{ChoiceOwner, Session};
use super::step::{Decision, StepId};
use crate::presentation::PresentationItem;
use crate::services::Services;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Immutable configuration of a conversation
#[derive(Clone)]
pub struct DialogueContext {
    pub conversation_id: String,
    pub registry: Arc<StepRegistry>,
    pub services: Services,
    /// Pause between committing a step and running its entry behavior
    pub entry_delay: Duration,
}

impl DialogueContext {
    pub fn new(
        conversation_id: impl Into<String>,
        registry: Arc<StepRegistry>,
        services: Services,
        entry_delay: Duration,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            registry,
            services,
            entry_delay,
        }
    }
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Session) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown step: {0}")]
    UnknownStep(StepId),
    #[error("Conversation already started")]
    AlreadyStarted,
    #[error("No offered choice at index {index}")]
    StaleChoice { index: usize },
    #[error("Stale entry for {step} (seq {seq}, current {current})")]
    StaleEntry { step: StepId, seq: u64, current: u64 },
}

/// Pure transition function
pub fn transition(
    session: &Session,
    context: &DialogueContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let mut next = session.clone();
    let mut effects: Vec<Effect> = echo_for(session, &context.registry, &event).into_iter().collect();

    match event {
        Event::Start => {
            if session.current_step.is_some() {
                return Err(TransitionError::AlreadyStarted);
            }
            let initial = context.registry.initial().clone();
            advance_to(&mut next, &mut effects, context, initial)?;
        }

        Event::UserSubmitted { text } => {
            let text = text.trim();
            match route(session, &context.registry, text) {
                Route::Ignore => return Ok(TransitionResult::new(next)),
                Route::Choice(index) => select(&mut next, &mut effects, context, index)?,
                Route::Text(step) => submit_text(session, &mut next, &mut effects, context, &step, text)?,
                Route::Fallback => fallback(&mut next, &mut effects, context),
            }
        }

        Event::ChoiceClicked { index } => select(&mut next, &mut effects, context, index)?,

        Event::EnterStep { step, seq } => enter(&mut next, &mut effects, context, step, seq)?,
    }

    if next.input_surface() != session.input_surface() {
        // The input area is redrawn before it takes focus
        let at = effects
            .iter()
            .position(|effect| *effect == Effect::FocusInput)
            .unwrap_or(effects.len());
        effects.insert(at, Effect::SyncInput);
    }

    Ok(TransitionResult::new(next).with_effects(effects))
}

/// The echo `event` owes the transcript: the trimmed text of a routed
/// submission, or the label of a clicked choice. It is shown even when the
/// rest of the transition fails.
pub fn echo_for(session: &Session, registry: &StepRegistry, event: &Event) -> Option<Effect> {
    match event {
        Event::UserSubmitted { text } => match route(session, registry, text) {
            Route::Ignore => None,
            Route::Choice(_) | Route::Text(_) | Route::Fallback => Some(Effect::echo_user(text.trim())),
        },
        Event::ChoiceClicked { index } => session
            .offered()
            .get(*index)
            .map(|choice| Effect::echo_user(choice.label.clone())),
        Event::Start | Event::EnterStep { .. } => None,
    }
}

/// Commit `target` as the current step and schedule its entry behavior
fn advance_to(
    next: &mut Session,
    effects: &mut Vec<Effect>,
    context: &DialogueContext,
    target: StepId,
) -> Result<(), TransitionError> {
    if !context.registry.contains(&target) {
        return Err(TransitionError::UnknownStep(target));
    }

    next.close_prompt();
    next.withdraw_choices();
    if &target == context.registry.initial() && next.current_step.is_some() {
        next.answers.clear();
    }
    next.current_step = Some(target.clone());
    next.entry_seq += 1;

    effects.push(Effect::ScheduleEntry {
        step: target,
        seq: next.entry_seq,
        delay: context.entry_delay,
    });
    Ok(())
}

fn enter(
    next: &mut Session,
    effects: &mut Vec<Effect>,
    context: &DialogueContext,
    step: StepId,
    seq: u64,
) -> Result<(), TransitionError> {
    if seq != next.entry_seq || next.current_step.as_ref() != Some(&step) {
        return Err(TransitionError::StaleEntry {
            step,
            seq,
            current: next.entry_seq,
        });
    }
    let kind = context
        .registry
        .get(&step)
        .ok_or_else(|| TransitionError::UnknownStep(step.clone()))?;

    // Re-entry starts from a clean hint
    next.set_hint(String::new());
    let mut scope = StepScope::new(&step, next, effects, &context.services);
    kind.on_enter(&mut scope);
    Ok(())
}

/// Process the offered choice at `index`, clicked or typed
fn select(
    next: &mut Session,
    effects: &mut Vec<Effect>,
    context: &DialogueContext,
    index: usize,
) -> Result<(), TransitionError> {
    let set = next
        .choices
        .clone()
        .ok_or(TransitionError::StaleChoice { index })?;
    let choice = set
        .choices
        .get(index)
        .cloned()
        .ok_or(TransitionError::StaleChoice { index })?;

    let target = match set.owner {
        ChoiceOwner::Fallback => choice.next.clone(),
        ChoiceOwner::Step(owner) => {
            let kind = context
                .registry
                .get(&owner)
                .ok_or_else(|| TransitionError::UnknownStep(owner.clone()))?;
            let answers_before = next.answers.clone();
            let decision = {
                let mut scope = StepScope::new(&owner, next, effects, &context.services);
                kind.handle_selection(&choice, &mut scope)
            };

            match decision {
                None | Some(Decision::Default) => choice.next.clone(),
                Some(Decision::Next(step)) => Some(step),
                Some(Decision::Error(message)) => {
                    next.answers = answers_before;
                    effects.push(Effect::Present(PresentationItem::new(message)));
                    return Ok(());
                }
                Some(Decision::Stay) => {
                    next.answers = answers_before;
                    Some(owner)
                }
            }
        }
    };

    if let Some(target) = target {
        advance_to(next, effects, context, target)?;
    }
    Ok(())
}

fn submit_text(
    before: &Session,
    next: &mut Session,
    effects: &mut Vec<Effect>,
    context: &DialogueContext,
    step: &StepId,
    text: &str,
) -> Result<(), TransitionError> {
    let kind = context
        .registry
        .get(step)
        .ok_or_else(|| TransitionError::UnknownStep(step.clone()))?;
    let decision = {
        let mut scope = StepScope::new(step, next, effects, &context.services);
        kind.handle_input(text, &mut scope)
    };

    match decision {
        None => fallback(next, effects, context),
        Some(Decision::Stay) => {
            next.answers = before.answers.clone();
            effects.push(Effect::FocusInput);
        }
        Some(Decision::Error(message)) => {
            next.answers = before.answers.clone();
            effects.push(Effect::Present(PresentationItem::new(message)));
            effects.push(Effect::FocusInput);
        }
        Some(Decision::Next(target)) => {
            next.close_prompt();
            advance_to(next, effects, context, target)?;
        }
        Some(Decision::Default) => {
            next.close_prompt();
            if let Some(target) = kind.default_next() {
                advance_to(next, effects, context, target)?;
            }
        }
    }
    Ok(())
}

fn fallback(next: &mut Session, effects: &mut Vec<Effect>, context: &DialogueContext) {
    let fallback = context.registry.fallback();
    effects.push(Effect::Present(PresentationItem::new(fallback.message.clone())));
    next.offer(ChoiceOwner::Fallback, fallback.choices.clone());
}
