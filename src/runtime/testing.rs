//! Mock implementations for testing
//!
//! These mocks drive the state machine and the runtime without a terminal,
//! real randomness or the wall clock.

use super::{start, DialogueHandle};
use crate::config::PacingConfig;
use crate::presentation::{BubbleId, InputSurface, MarkupTag, Renderer};
use crate::script;
use crate::services::{Clock, Services, TicketId, TicketIssuer, TrackingLookup, TrackingQuery, TrackingSummary};
use crate::state_machine::{echo_for, transition, DialogueContext, Effect, Event, Session, StepRegistry, TransitionError};
use chrono::{DateTime, Local, TimeZone};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ============================================================================
// Recording Renderer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOp {
    User(String),
    Begin(BubbleId),
    Start(BubbleId),
    Open(BubbleId, MarkupTag),
    Close(BubbleId, MarkupTag),
    Break(BubbleId),
    Text(BubbleId, String),
    Finish(BubbleId),
    Scroll,
    Input(InputSurface),
    Focus,
}

/// Records every renderer call with the (virtual) time it happened
#[derive(Default)]
pub struct RecordingRenderer {
    ops: Mutex<Vec<(Instant, RenderOp)>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, op: RenderOp) {
        self.ops.lock().unwrap().push((Instant::now(), op));
    }

    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().unwrap().iter().map(|(_, op)| op.clone()).collect()
    }

    pub fn timed_ops(&self) -> Vec<(Instant, RenderOp)> {
        self.ops.lock().unwrap().clone()
    }

    /// Revealed text of each bot bubble, in the order bubbles began
    pub fn bot_texts(&self) -> Vec<String> {
        let mut order = Vec::new();
        let mut texts: HashMap<BubbleId, String> = HashMap::new();
        for op in self.ops() {
            match op {
                RenderOp::Begin(bubble) => {
                    order.push(bubble);
                    texts.insert(bubble, String::new());
                }
                RenderOp::Text(bubble, text) => texts.entry(bubble).or_default().push_str(&text),
                _ => {}
            }
        }
        order.into_iter().filter_map(|bubble| texts.remove(&bubble)).collect()
    }

    pub fn user_texts(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                RenderOp::User(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// When each text fragment of `bubble` was pushed
    pub fn text_times(&self, bubble: BubbleId) -> Vec<Instant> {
        self.timed_ops()
            .into_iter()
            .filter(|(_, op)| matches!(op, RenderOp::Text(id, _) if *id == bubble))
            .map(|(at, _)| at)
            .collect()
    }

    pub fn last_input(&self) -> Option<InputSurface> {
        self.ops().into_iter().rev().find_map(|op| match op {
            RenderOp::Input(surface) => Some(surface),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn append_user(&self, text: &str) {
        self.record(RenderOp::User(text.to_string()));
    }

    fn begin_bubble(&self, bubble: BubbleId) {
        self.record(RenderOp::Begin(bubble));
    }

    fn start_content(&self, bubble: BubbleId) {
        self.record(RenderOp::Start(bubble));
    }

    fn open(&self, bubble: BubbleId, tag: &MarkupTag) {
        self.record(RenderOp::Open(bubble, tag.clone()));
    }

    fn close(&self, bubble: BubbleId, tag: &MarkupTag) {
        self.record(RenderOp::Close(bubble, tag.clone()));
    }

    fn line_break(&self, bubble: BubbleId) {
        self.record(RenderOp::Break(bubble));
    }

    fn push_text(&self, bubble: BubbleId, text: &str) {
        self.record(RenderOp::Text(bubble, text.to_string()));
    }

    fn finish_bubble(&self, bubble: BubbleId) {
        self.record(RenderOp::Finish(bubble));
    }

    fn scroll_to_bottom(&self) {
        self.record(RenderOp::Scroll);
    }

    fn show_input(&self, surface: &InputSurface) {
        self.record(RenderOp::Input(surface.clone()));
    }

    fn focus_input(&self) {
        self.record(RenderOp::Focus);
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// A clock stuck at one instant
pub struct FixedClock(DateTime<Local>);

impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self(
            Local
                .with_ymd_and_hms(year, month, day, hour, minute, 0)
                .single()
                .expect("unambiguous local time"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Always reports the same scan
pub struct FixedTracking {
    pub queries: Mutex<Vec<TrackingQuery>>,
}

impl TrackingLookup for FixedTracking {
    fn lookup(&self, query: &TrackingQuery) -> TrackingSummary {
        self.queries.lock().unwrap().push(query.clone());
        TrackingSummary {
            status: "In transit".to_string(),
            last_scan: "Mar 21, 4:00 PM · Memphis, TN hub".to_string(),
            eta: "Mar 24, 8:00 PM".to_string(),
        }
    }
}

/// Ticket numbers counting up from 100001
pub struct SequentialTickets {
    next: AtomicU32,
}

impl Default for SequentialTickets {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(100_001),
        }
    }
}

impl TicketIssuer for SequentialTickets {
    fn issue(&self, prefix: &str) -> TicketId {
        TicketId::new(prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Deterministic collaborators; today is 2024-03-22
pub fn test_services() -> Services {
    Services {
        tracking: Arc::new(FixedTracking {
            queries: Mutex::new(Vec::new()),
        }),
        tickets: Arc::new(SequentialTickets::default()),
        clock: Arc::new(FixedClock::at(2024, 3, 22, 10, 30)),
    }
}

// ============================================================================
// Synchronous Driver
// ============================================================================

/// Feeds events straight into the transition function, firing scheduled
/// entries immediately instead of after their delay
pub struct ScriptDriver {
    pub context: DialogueContext,
    pub session: Session,
    pending: VecDeque<Event>,
    said: Vec<String>,
    echoed: Vec<String>,
}

impl ScriptDriver {
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            context: DialogueContext::new("test-conv", Arc::new(registry), test_services(), Duration::ZERO),
            session: Session::new(),
            pending: VecDeque::new(),
            said: Vec::new(),
            echoed: Vec::new(),
        }
    }

    /// Driver for the support script
    pub fn script() -> Self {
        Self::new(script::build_registry().expect("script registry"))
    }

    /// Apply one event; a failed transition leaves everything but the echo
    /// untouched
    pub fn dispatch(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let echo = echo_for(&self.session, &self.context.registry, &event);
        let result = match transition(&self.session, &self.context, event) {
            Ok(result) => result,
            Err(error) => {
                if let (TransitionError::UnknownStep(_), Some(Effect::EchoUser { text })) = (&error, echo) {
                    self.echoed.push(text);
                }
                return Err(error);
            }
        };
        self.session = result.new_state;
        for effect in &result.effects {
            match effect {
                Effect::EchoUser { text } => self.echoed.push(text.clone()),
                Effect::Present(item) => self.said.push(item.content.to_markup()),
                Effect::ScheduleEntry { step, seq, .. } => self.pending.push_back(Event::EnterStep {
                    step: step.clone(),
                    seq: *seq,
                }),
                Effect::SyncInput | Effect::FocusInput => {}
            }
        }
        Ok(result.effects)
    }

    /// Fire every scheduled entry; superseded ones are rejected as stale
    pub fn settle(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            let _ = self.dispatch(event);
        }
    }

    pub fn start(&mut self) {
        self.dispatch(Event::Start).expect("start");
        self.settle();
    }

    /// Submit text and run the resulting entries
    pub fn submit(&mut self, text: &str) -> Vec<Effect> {
        let effects = self.dispatch(Event::submitted(text)).expect("submit");
        self.settle();
        effects
    }

    /// Click the offered choice at `index` and run the resulting entries
    pub fn click(&mut self, index: usize) -> Vec<Effect> {
        let effects = self.dispatch(Event::ChoiceClicked { index }).expect("click");
        self.settle();
        effects
    }

    pub fn current_step(&self) -> Option<&str> {
        self.session.current_step.as_ref().map(|step| step.as_str())
    }

    /// Markup of every bot message so far
    pub fn said(&self) -> Vec<String> {
        self.said.clone()
    }

    pub fn last_said(&self) -> &str {
        self.said.last().map_or("", String::as_str)
    }

    pub fn echoed(&self) -> Vec<String> {
        self.echoed.clone()
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// A running dialogue wired to a recording renderer
pub struct TestRuntime {
    pub handle: DialogueHandle,
    pub renderer: Arc<RecordingRenderer>,
    pub task: JoinHandle<Session>,
}

impl TestRuntime {
    pub fn builder() -> TestRuntimeBuilder {
        TestRuntimeBuilder::new()
    }

    /// Stop the runtime and return its final session
    pub async fn finish(self) -> Session {
        self.handle.shutdown();
        self.task.await.expect("runtime task")
    }
}

pub struct TestRuntimeBuilder {
    registry: Option<StepRegistry>,
    pacing: PacingConfig,
}

impl TestRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            pacing: PacingConfig::instant(),
        }
    }

    pub fn registry(mut self, registry: StepRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn build(self) -> TestRuntime {
        let registry = self
            .registry
            .unwrap_or_else(|| script::build_registry().expect("script registry"));
        let context = DialogueContext::new(
            "test-conv",
            Arc::new(registry),
            test_services(),
            self.pacing.entry_delay,
        );
        let renderer = Arc::new(RecordingRenderer::new());
        let (handle, task) = start(context, self.pacing, renderer.clone());
        TestRuntime {
            handle,
            renderer,
            task,
        }
    }
}

impl Default for TestRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::fields;
    use crate::state_machine::{Choice, Decision, PromptSpec, Step, StepId, StepKind, StepScope, TextStep};

    const GREETING: &str = "Hi, I'm Boxy! Can I assist you with your lost package today?";

    #[tokio::test(start_paused = true)]
    async fn test_start_greets_then_offers_choices() {
        let rt = TestRuntime::builder().build();
        rt.handle.settled().await.unwrap();

        assert_eq!(rt.renderer.bot_texts(), vec![GREETING.to_string()]);
        let surface = rt.renderer.last_input().unwrap();
        assert_eq!(surface.choices.len(), 4);
        assert_eq!(surface.field.unwrap().label, "Choose an option");

        let ops = rt.renderer.ops();
        let finished = ops.iter().position(|op| matches!(op, RenderOp::Finish(_))).unwrap();
        let input = ops.iter().position(|op| matches!(op, RenderOp::Input(_))).unwrap();
        assert!(finished < input);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_waits_for_pacing_delay() {
        let rt = TestRuntime::builder().pacing(PacingConfig::default()).build();
        rt.handle.settled().await.unwrap();

        let clicked_at = Instant::now();
        rt.handle.select(2).await.unwrap();
        rt.handle.settled().await.unwrap();

        let (began_at, _) = rt
            .renderer
            .timed_ops()
            .into_iter()
            .filter(|(_, op)| matches!(op, RenderOp::Begin(_)))
            .nth(1)
            .unwrap();
        assert_eq!(began_at - clicked_at, Duration::from_millis(260));
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_precedes_bot_reply() {
        let rt = TestRuntime::builder().build();
        rt.handle.settled().await.unwrap();

        rt.handle.submit("  Package arrived damaged ").await.unwrap();
        rt.handle.settled().await.unwrap();

        let ops = rt.renderer.ops();
        let echo = ops
            .iter()
            .position(|op| *op == RenderOp::User("Package arrived damaged".to_string()))
            .unwrap();
        let second_bubble = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, RenderOp::Begin(_)))
            .nth(1)
            .map(|(index, _)| index)
            .unwrap();
        assert!(echo < second_bubble);
        assert_eq!(
            rt.renderer.bot_texts()[1],
            "I am so sorry to hear that. Can you describe the damage?"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_submission_leaves_no_trace() {
        let rt = TestRuntime::builder().build();
        rt.handle.settled().await.unwrap();
        let before = rt.renderer.ops().len();

        rt.handle.submit("   ").await.unwrap();
        rt.handle.settled().await.unwrap();

        assert_eq!(rt.renderer.ops().len(), before);
        assert!(rt.renderer.user_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_damaged_package_flow() {
        let rt = TestRuntime::builder().build();
        rt.handle.settled().await.unwrap();

        rt.handle.select(2).await.unwrap();
        rt.handle.settled().await.unwrap();
        rt.handle.submit("cracked").await.unwrap();
        rt.handle.submit("Box was crushed in transit").await.unwrap();
        rt.handle.settled().await.unwrap();

        let session = rt.handle.session();
        assert_eq!(session.current_step, Some(script::CLAIM_FILED));
        assert_eq!(session.answers.get(fields::CLAIM_ID), Some("CLM-100001"));
        assert_eq!(
            rt.renderer.user_texts(),
            vec!["Package arrived damaged", "cracked", "Box was crushed in transit"]
        );
        assert!(rt
            .renderer
            .bot_texts()
            .contains(&"Could you share a few more details about the damage?".to_string()));

        let final_session = rt.finish().await;
        assert_eq!(final_session, session);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_entry() {
        let rt = TestRuntime::builder().pacing(PacingConfig::default()).build();
        rt.handle.settled().await.unwrap();

        rt.handle.select(0).await.unwrap();
        while rt.handle.session().current_step != Some(script::ASK_TRACKING_NUMBER) {
            tokio::task::yield_now().await;
        }
        let renderer = rt.renderer.clone();
        let session = rt.finish().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.current_step, Some(script::ASK_TRACKING_NUMBER));
        assert_eq!(renderer.bot_texts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_closed_runtime() {
        let rt = TestRuntime::builder().build();
        let handle = rt.handle.clone();
        rt.finish().await;
        assert!(handle.submit("hello").await.is_err());
    }

    struct Lost;

    impl Step for Lost {
        fn on_enter(&self, scope: &mut StepScope<'_>) {
            scope.say("Where to?");
            scope.offer_choices(vec![Choice::goto("Nowhere", StepId::from_static("nowhere"))]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_step_stalls_conversation() {
        let start = StepId::from_static("start");
        let registry = StepRegistry::builder(start.clone())
            .step(start.clone(), StepKind::entry(Lost))
            .fallback("Off topic", vec![Choice::goto("Back", start.clone())])
            .build()
            .unwrap();
        let rt = TestRuntime::builder().registry(registry).build();
        rt.handle.settled().await.unwrap();

        rt.handle.select(0).await.unwrap();
        rt.handle.settled().await.unwrap();

        let session = rt.handle.session();
        assert_eq!(session.current_step, Some(start));
        assert_eq!(session.offered().len(), 1);
        // Only the echo of a failed transition reaches the transcript
        assert_eq!(rt.renderer.user_texts(), vec!["Nowhere"]);
        assert_eq!(rt.renderer.bot_texts().len(), 1);
    }

    /// Accepts any name, then heads for a step nobody registered
    struct AskName;

    impl Step for AskName {
        fn on_enter(&self, scope: &mut StepScope<'_>) {
            scope.say("Name?");
            scope.show_text_input(PromptSpec::new("Name"));
        }
    }

    impl TextStep for AskName {
        fn on_input(&self, raw: &str, scope: &mut StepScope<'_>) -> Decision {
            scope.say(format!("Thanks, {raw}."));
            Decision::Next(StepId::from_static("nowhere"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_echoed_when_handler_names_unknown_step() {
        let start = StepId::from_static("start");
        let registry = StepRegistry::builder(start.clone())
            .step(start.clone(), StepKind::text(AskName))
            .fallback("Off topic", vec![Choice::goto("Back", start.clone())])
            .build()
            .unwrap();
        let rt = TestRuntime::builder().registry(registry).build();
        rt.handle.settled().await.unwrap();

        rt.handle.submit("Ada").await.unwrap();
        rt.handle.settled().await.unwrap();

        assert_eq!(rt.renderer.user_texts(), vec!["Ada"]);
        // The handler's reply belongs to the failed transition
        assert_eq!(rt.renderer.bot_texts(), vec!["Name?"]);
        let session = rt.handle.session();
        assert_eq!(session.current_step, Some(start));
        assert!(session.prompt.is_some());
    }
}
