//! Step types used by the support script

use super::validate::{self, ValidationError, CARRIERS};
use super::{fields, AGENT_TRANSFER, ALERTS_CONFIGURED, CLOSING, SHOW_TRACKING_STATUS};
use crate::presentation::Content;
use crate::services::{TicketId, TrackingQuery};
use crate::state_machine::{Choice, ChoiceStep, Decision, PromptSpec, Step, StepId, StepScope, TextStep};

/// Says its message and offers a fixed set of choices
pub(super) struct Menu {
    message: Content,
    choices: Vec<Choice>,
}

impl Menu {
    pub(super) fn new(message: impl Into<Content>, choices: Vec<Choice>) -> Self {
        Self {
            message: message.into(),
            choices,
        }
    }
}

impl Step for Menu {
    fn on_enter(&self, scope: &mut StepScope<'_>) {
        scope.say(self.message.clone());
        scope.offer_choices(self.choices.clone());
    }
}

// ============================================================================
// Free Text
// ============================================================================

pub(super) type Validator = fn(&str, &StepScope<'_>) -> Result<String, ValidationError>;

/// Asks a question, validates the answer and records it under `field`
pub(super) struct FreeTextStep {
    pub(super) question: &'static str,
    pub(super) prompt: PromptSpec,
    pub(super) field: &'static str,
    pub(super) validate: Validator,
    /// Reply to an accepted value
    pub(super) acknowledge: fn(&str) -> String,
    pub(super) next: StepId,
}

impl Step for FreeTextStep {
    fn on_enter(&self, scope: &mut StepScope<'_>) {
        scope.say(self.question);
        scope.show_text_input(self.prompt.clone());
    }
}

impl TextStep for FreeTextStep {
    fn on_input(&self, raw: &str, scope: &mut StepScope<'_>) -> Decision {
        match (self.validate)(raw, scope) {
            Err(rejection) => {
                tracing::debug!(step = %scope.step(), reason = rejection.message, "Answer rejected");
                scope.say(rejection.message);
                scope.set_hint(rejection.hint);
                Decision::Stay
            }
            Ok(value) => {
                scope.clear_hint();
                let reply = (self.acknowledge)(&value);
                scope.record(self.field, value);
                scope.say(reply);
                Decision::Default
            }
        }
    }

    fn default_next(&self) -> Option<StepId> {
        Some(self.next.clone())
    }
}

pub(super) fn tracking_number(raw: &str, _scope: &StepScope<'_>) -> Result<String, ValidationError> {
    validate::tracking_number(raw)
}

pub(super) fn expected_date(raw: &str, scope: &StepScope<'_>) -> Result<String, ValidationError> {
    validate::expected_date(raw, scope.today())
}

pub(super) fn damage_description(raw: &str, _scope: &StepScope<'_>) -> Result<String, ValidationError> {
    validate::damage_description(raw)
}

// ============================================================================
// Carrier and Tracking
// ============================================================================

pub(super) struct CarrierStep;

impl Step for CarrierStep {
    fn on_enter(&self, scope: &mut StepScope<'_>) {
        scope.say("Which carrier is moving this package?");
        scope.offer_choices(
            CARRIERS
                .iter()
                .map(|carrier| Choice::new(*carrier).with_value(*carrier))
                .collect(),
        );
    }
}

impl ChoiceStep for CarrierStep {
    fn on_select(&self, choice: &Choice, scope: &mut StepScope<'_>) -> Decision {
        let Some(carrier) = choice.value.as_deref().and_then(validate::carrier) else {
            scope.say("Please choose UPS, USPS, or FedEx.");
            return Decision::Stay;
        };
        scope.record(fields::CARRIER, carrier);
        scope.say(format!("Thanks! Let me check {carrier} for you."));
        Decision::Next(SHOW_TRACKING_STATUS)
    }
}

pub(super) struct TrackingStatusStep;

impl Step for TrackingStatusStep {
    fn on_enter(&self, scope: &mut StepScope<'_>) {
        let query = TrackingQuery {
            tracking_number: scope.answer(fields::TRACKING_NUMBER).map(str::to_string),
            carrier: scope.answer(fields::CARRIER).map(str::to_string),
        };
        let summary = scope.lookup_tracking(&query);
        scope.say(vec![
            format!("Status: {}", summary.status),
            format!("<small>Last scan: {}</small>", summary.last_scan),
            format!("<small>ETA: {}</small>", summary.eta),
        ]);
        scope.offer_choices(vec![
            Choice::goto("Set delivery alerts", ALERTS_CONFIGURED),
            Choice::goto("Talk to an agent", AGENT_TRANSFER),
            Choice::goto("All set", CLOSING),
        ]);
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Opens a ticket on entry and records its id
pub(super) struct TicketStep {
    pub(super) prefix: &'static str,
    pub(super) field: &'static str,
    pub(super) announce: fn(&TicketId) -> String,
    pub(super) choices: Vec<Choice>,
}

impl Step for TicketStep {
    fn on_enter(&self, scope: &mut StepScope<'_>) {
        let ticket = scope.issue_ticket(self.prefix);
        tracing::info!(ticket = %ticket, "Ticket issued");
        scope.record(self.field, ticket.as_str());
        scope.say((self.announce)(&ticket));
        scope.offer_choices(self.choices.clone());
    }
}
