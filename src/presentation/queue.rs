//! Single-consumer presentation queue
//!
//! Items are parsed on enqueue and revealed strictly in order by one
//! consumer task. A reveal always runs to completion; later items wait.
//! Input-area updates ride the same queue so the choices for a message
//! never appear before the message itself.

use super::item::PresentationItem;
use super::markup::{self, Display, RevealNode};
use super::renderer::{BubbleId, InputSurface, Renderer};
use crate::config::PacingConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One unit of presentation work
#[derive(Debug, Clone)]
pub struct RevealJob {
    pub bubble: BubbleId,
    pub nodes: Vec<RevealNode>,
    pub pacing: PacingConfig,
}

enum Command {
    Reveal(RevealJob),
    Input(InputSurface),
    Focus,
    /// Resolves once everything queued before it has been revealed
    Barrier(oneshot::Sender<()>),
}

/// Handle for enqueuing bot bubbles
#[derive(Clone)]
pub struct PresentationQueue {
    tx: mpsc::UnboundedSender<Command>,
    next_bubble: Arc<AtomicU64>,
    pacing: PacingConfig,
}

impl PresentationQueue {
    /// Spawn the consumer task. It runs until every handle is dropped.
    pub fn spawn<R: Renderer + 'static>(renderer: Arc<R>, pacing: PacingConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = tokio::spawn(consume(rx, renderer));
        let queue = Self {
            tx,
            next_bubble: Arc::new(AtomicU64::new(1)),
            pacing,
        };
        (queue, consumer)
    }

    /// Queue an item behind everything already pending
    pub fn enqueue(&self, item: &PresentationItem) -> BubbleId {
        let bubble = self.next_bubble.fetch_add(1, Ordering::Relaxed);
        let job = RevealJob {
            bubble,
            nodes: markup::parse(&item.content.to_markup()),
            pacing: self.pacing.clone(),
        };
        if self.tx.send(Command::Reveal(job)).is_err() {
            tracing::warn!(bubble, "Presentation queue closed, dropping bot message");
        }
        bubble
    }

    /// Redraw the input area once everything queued so far is revealed
    pub fn sync_input(&self, surface: InputSurface) {
        if self.tx.send(Command::Input(surface)).is_err() {
            tracing::warn!("Presentation queue closed, dropping input update");
        }
    }

    pub fn focus_input(&self) {
        if self.tx.send(Command::Focus).is_err() {
            tracing::warn!("Presentation queue closed, dropping input focus");
        }
    }

    /// Wait until every item enqueued so far has finished revealing
    pub async fn settled(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Barrier(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

async fn consume<R: Renderer + 'static>(mut rx: mpsc::UnboundedReceiver<Command>, renderer: Arc<R>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Reveal(job) => reveal(renderer.as_ref(), &job).await,
            Command::Input(surface) => renderer.show_input(&surface),
            Command::Focus => renderer.focus_input(),
            Command::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Presentation queue closed");
}

/// Reveal one bubble: composing affordance, settle pause, then node by node
pub async fn reveal<R: Renderer + ?Sized>(renderer: &R, job: &RevealJob) {
    let bubble = job.bubble;
    let pacing = &job.pacing;

    renderer.begin_bubble(bubble);
    renderer.scroll_to_bottom();
    pause(pacing.settle).await;

    renderer.start_content(bubble);
    for node in &job.nodes {
        match node {
            RevealNode::Open(tag) => {
                renderer.open(bubble, tag);
                renderer.scroll_to_bottom();
                if tag.display() == Display::Block {
                    pause(pacing.layout_yield).await;
                }
            }
            RevealNode::Close(tag) => renderer.close(bubble, tag),
            RevealNode::LineBreak => {
                renderer.line_break(bubble);
                renderer.scroll_to_bottom();
                pause(pacing.layout_yield).await;
            }
            RevealNode::Text(text) => type_text(renderer, bubble, text, pacing).await,
        }
    }

    renderer.finish_bubble(bubble);
    renderer.scroll_to_bottom();
}

async fn type_text<R: Renderer + ?Sized>(renderer: &R, bubble: BubbleId, text: &str, pacing: &PacingConfig) {
    if text.trim().is_empty() {
        renderer.push_text(bubble, text);
        return;
    }

    let mut chars = text.chars().peekable();
    let mut buf = [0u8; 4];
    while let Some(ch) = chars.next() {
        renderer.push_text(bubble, ch.encode_utf8(&mut buf));
        renderer.scroll_to_bottom();
        if chars.peek().is_some() {
            pause(pacing.delay_after(ch)).await;
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
