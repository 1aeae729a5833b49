//! Boxy - scripted package support chat
//!
//! Runs the support conversation in a terminal. Type an answer, or `#N` to
//! pick the N-th offered choice. The transcript goes to stdout, logs to
//! stderr.

mod config;
mod presentation;
mod runtime;
mod script;
mod services;
mod state_machine;
mod terminal;

use config::DialogueConfig;
use runtime::{DialogueHandle, RuntimeClosed};
use services::Services;
use state_machine::DialogueContext;
use std::sync::Arc;
use terminal::TerminalRenderer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxy_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = DialogueConfig::from_env();
    let registry = Arc::new(script::build_registry()?);
    let conversation_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conv_id = %conversation_id, pacing = ?config.pacing, "Starting Boxy");

    let context = DialogueContext::new(
        conversation_id,
        registry,
        Services::simulated(),
        config.pacing.entry_delay,
    );
    let (handle, task) = runtime::start(context, config.pacing, Arc::new(TerminalRenderer::new()));

    tokio::select! {
        result = read_input(&handle) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    handle.shutdown();
    let session = task.await?;
    tracing::info!(
        step = ?session.current_step,
        answers = %serde_json::to_string(&session.answers)?,
        "Conversation ended"
    );

    Ok(())
}

/// Feed stdin lines to the conversation, one at a time once the bot has
/// finished talking. Returns at end of input.
async fn read_input(handle: &DialogueHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        handle.settled().await?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        dispatch_line(handle, &line).await?;
    }
}

async fn dispatch_line(handle: &DialogueHandle, line: &str) -> Result<(), RuntimeClosed> {
    match parse_click(line) {
        Some(index) => handle.select(index).await,
        None => handle.submit(line).await,
    }
}

/// `#N` clicks the N-th offered choice (one-based)
fn parse_click(line: &str) -> Option<usize> {
    let number: usize = line.trim().strip_prefix('#')?.trim().parse().ok()?;
    number.checked_sub(1)
}
