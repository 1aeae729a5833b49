//! Dialogue runtime executor

use crate::presentation::{PresentationQueue, Renderer};
use crate::state_machine::{echo_for, transition, DialogueContext, Effect, Event, Session, TransitionError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Messages accepted by the runtime loop
#[derive(Debug)]
pub(crate) enum Command {
    Event(Event),
    /// Reply once no step entry is pending and the queue has drained
    Settled(oneshot::Sender<()>),
}

/// Owns the session and runs every event through the pure transition function
pub struct DialogueRuntime<R: Renderer + 'static> {
    context: DialogueContext,
    session: Session,
    renderer: Arc<R>,
    queue: PresentationQueue,
    command_rx: mpsc::Receiver<Command>,
    command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    session_tx: watch::Sender<Session>,
    /// Sequence number of the entry timer that has not fired yet
    pending_entry: Option<u64>,
    settle_waiters: Vec<oneshot::Sender<()>>,
}

impl<R: Renderer + 'static> DialogueRuntime<R> {
    pub(crate) fn new(
        context: DialogueContext,
        renderer: Arc<R>,
        queue: PresentationQueue,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::Sender<Command>,
        cancel: CancellationToken,
        session_tx: watch::Sender<Session>,
    ) -> Self {
        Self {
            context,
            session: Session::new(),
            renderer,
            queue,
            command_rx,
            command_tx,
            cancel,
            session_tx,
            pending_entry: None,
            settle_waiters: Vec::new(),
        }
    }

    /// Run until cancelled; returns the final session
    pub async fn run(mut self) -> Session {
        tracing::info!(
            conv_id = %self.context.conversation_id,
            steps = self.context.registry.len(),
            "Starting dialogue runtime"
        );

        self.process_event(Event::Start);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                Some(command) = self.command_rx.recv() => match command {
                    Command::Event(event) => self.process_event(event),
                    Command::Settled(done) => {
                        self.settle_waiters.push(done);
                        self.flush_settled();
                    }
                },
                else => break,
            }
        }

        tracing::info!(conv_id = %self.context.conversation_id, "Dialogue runtime stopped");
        self.session
    }

    fn process_event(&mut self, event: Event) {
        let entry = match &event {
            Event::EnterStep { step, seq } => Some((step.clone(), *seq)),
            _ => None,
        };
        let echo = echo_for(&self.session, &self.context.registry, &event);

        match transition(&self.session, &self.context, event) {
            Ok(result) => {
                self.session = result.new_state;
                if let Some((step, _)) = &entry {
                    tracing::info!(conv_id = %self.context.conversation_id, step = %step, "Entered step");
                }
                for effect in result.effects {
                    self.execute_effect(effect);
                }
                tracing::debug!(session = %self.session.snapshot(), "Session committed");
                self.session_tx.send_replace(self.session.clone());
            }
            Err(error @ TransitionError::UnknownStep(_)) => {
                tracing::error!(
                    conv_id = %self.context.conversation_id,
                    current = ?self.session.current_step,
                    error = %error,
                    "Transition failed, staying on current step"
                );
                // The user's own words stay in the transcript
                if let Some(echo) = echo {
                    self.execute_effect(echo);
                }
            }
            Err(error @ TransitionError::AlreadyStarted) => {
                tracing::warn!(error = %error, "Ignoring start event");
            }
            Err(error) => {
                tracing::debug!(error = %error, "Dropping stale event");
            }
        }

        if let Some((_, seq)) = entry {
            if self.pending_entry == Some(seq) {
                self.pending_entry = None;
            }
        }
        self.flush_settled();
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::EchoUser { text } => {
                self.renderer.append_user(&text);
                self.renderer.scroll_to_bottom();
            }

            Effect::Present(item) => {
                self.queue.enqueue(&item);
            }

            Effect::ScheduleEntry { step, seq, delay } => {
                self.pending_entry = Some(seq);
                let command_tx = self.command_tx.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            tracing::debug!(step = %step, seq, "Entry timer cancelled");
                        }
                        () = tokio::time::sleep(delay) => {
                            let _ = command_tx.send(Command::Event(Event::EnterStep { step, seq })).await;
                        }
                    }
                });
            }

            Effect::SyncInput => self.queue.sync_input(self.session.input_surface()),

            Effect::FocusInput => self.queue.focus_input(),
        }
    }

    /// Answer settle requests once nothing is left to schedule
    fn flush_settled(&mut self) {
        if self.pending_entry.is_some() || self.settle_waiters.is_empty() {
            return;
        }
        let waiters = std::mem::take(&mut self.settle_waiters);
        let queue = self.queue.clone();
        tokio::spawn(async move {
            queue.settled().await;
            for done in waiters {
                let _ = done.send(());
            }
        });
    }
}
