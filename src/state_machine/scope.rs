//! The handle a step handler works through
//!
//! Handlers never touch the session or the renderer directly: everything
//! they do is recorded on the in-progress transition and committed (or
//! discarded) with it.

use super::effect::Effect;
use super::state::{ChoiceOwner, PromptSpec, Session};
use super::step::{Choice, StepId};
use crate::presentation::{Content, PresentationItem};
use crate::services::{Services, TicketId, TrackingQuery, TrackingSummary};
use chrono::NaiveDate;

pub struct StepScope<'a> {
    step: &'a StepId,
    session: &'a mut Session,
    effects: &'a mut Vec<Effect>,
    services: &'a Services,
}

impl<'a> StepScope<'a> {
    pub(crate) fn new(
        step: &'a StepId,
        session: &'a mut Session,
        effects: &'a mut Vec<Effect>,
        services: &'a Services,
    ) -> Self {
        Self {
            step,
            session,
            effects,
            services,
        }
    }

    /// The step this handler runs for
    pub fn step(&self) -> &StepId {
        self.step
    }

    /// Queue a bot bubble
    pub fn say(&mut self, content: impl Into<Content>) {
        self.effects
            .push(Effect::Present(PresentationItem::new(content)));
    }

    /// Hand the free-text field to this step
    pub fn show_text_input(&mut self, spec: PromptSpec) {
        self.session.open_prompt(self.step, spec);
    }

    /// Offer choices owned by this step
    pub fn offer_choices(&mut self, choices: Vec<Choice>) {
        self.session.offer(ChoiceOwner::Step(self.step.clone()), choices);
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.session.set_hint(hint);
    }

    pub fn clear_hint(&mut self) {
        self.session.set_hint(String::new());
    }

    /// Record a validated answer; writes to a field owned by another step are
    /// refused and logged
    pub fn record(&mut self, field: &'static str, value: impl Into<String>) {
        if let Err(conflict) = self.session.answers.record(self.step, field, value) {
            tracing::warn!(error = %conflict, "Refusing answer overwrite");
        }
    }

    pub fn answer(&self, field: &str) -> Option<&str> {
        self.session.answers.get(field)
    }

    pub fn issue_ticket(&self, prefix: &str) -> TicketId {
        self.services.tickets.issue(prefix)
    }

    pub fn lookup_tracking(&self, query: &TrackingQuery) -> TrackingSummary {
        self.services.tracking.lookup(query)
    }

    pub fn today(&self) -> NaiveDate {
        self.services.clock.today()
    }
}
