//! Runtime for executing a conversation
//!
//! The runtime task owns the session. Callers talk to it through a
//! [`DialogueHandle`]; bot output flows to the renderer through the
//! presentation queue.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::DialogueRuntime;

use crate::config::PacingConfig;
use crate::presentation::{PresentationQueue, Renderer};
use crate::state_machine::{DialogueContext, Event, Session};
use executor::Command;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
#[error("dialogue runtime has stopped")]
pub struct RuntimeClosed;

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct DialogueHandle {
    command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    session_rx: watch::Receiver<Session>,
}

impl DialogueHandle {
    /// Submit the text field
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeClosed> {
        self.send(Event::submitted(text)).await
    }

    /// Click the offered choice at `index` (zero-based)
    pub async fn select(&self, index: usize) -> Result<(), RuntimeClosed> {
        self.send(Event::ChoiceClicked { index }).await
    }

    /// Wait until pending step entries have run and every bot bubble has
    /// finished revealing
    pub async fn settled(&self) -> Result<(), RuntimeClosed> {
        let (done_tx, done_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Settled(done_tx))
            .await
            .map_err(|_| RuntimeClosed)?;
        done_rx.await.map_err(|_| RuntimeClosed)
    }

    /// Last committed session
    pub fn session(&self) -> Session {
        self.session_rx.borrow().clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeClosed> {
        self.command_tx
            .send(Command::Event(event))
            .await
            .map_err(|_| RuntimeClosed)
    }
}

/// Spawn the presentation consumer and the runtime loop. The runtime enters
/// the initial step immediately; the join handle yields the final session
/// after shutdown.
pub fn start<R: Renderer + 'static>(
    context: DialogueContext,
    pacing: PacingConfig,
    renderer: Arc<R>,
) -> (DialogueHandle, JoinHandle<Session>) {
    let (queue, _consumer) = PresentationQueue::spawn(renderer.clone(), pacing);
    let (command_tx, command_rx) = mpsc::channel(32);
    let (session_tx, session_rx) = watch::channel(Session::new());
    let cancel = CancellationToken::new();

    let runtime = DialogueRuntime::new(
        context,
        renderer,
        queue,
        command_rx,
        command_tx.clone(),
        cancel.clone(),
        session_tx,
    );
    let task = tokio::spawn(runtime.run());

    (
        DialogueHandle {
            command_tx,
            cancel,
            session_rx,
        },
        task,
    )
}
