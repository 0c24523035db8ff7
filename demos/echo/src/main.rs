//! Echo Bot Demo
//!
//! A miniature chat bot built on the evproc dispatch chain. It welcomes new
//! users, echoes their messages back, and logs everything it does not
//! recognize, with a trace middleware wrapped around the whole chain.
//!
//! The transport is stubbed out: events arrive as a fixed feed of JSON lines,
//! the way a long-polling client would deliver them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-demo
//! RUST_LOG=debug cargo run --package echo-demo   # show the dispatch machinery
//! ```

use std::sync::Arc;

use anyhow::Result;
use evproc::json::{field_eq, pointer_eq};
use evproc::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Inline stand-in for the transport: one wire-format event per line.
const FEED: &[&str] = &[
    r#"{"type": "bot_started"}"#,
    r#"{"type": "message_created", "message": {"text": "/start"}}"#,
    r#"{"type": "message_created", "message": {"text": "hello there"}}"#,
    r#"{"type": "message_created"}"#,
    r#"{"type": "presence_updated", "user": "ada"}"#,
];

#[derive(Debug, Error)]
#[error("message event carried no text")]
struct MissingText;

// ============================================================================
// Handlers
// ============================================================================

/// Greets on bot startup and on a `/start` command.
fn welcome(_event: &Value) -> Flow {
    info!("Welcome aboard! Send any message and it will be echoed");
    Flow::Halt
}

/// Echoes the text of an incoming message back to the log.
async fn echo(event: Arc<Value>) -> Result<Flow, MissingText> {
    let Some(text) = event.pointer("/message/text").and_then(Value::as_str) else {
        return Err(MissingText);
    };
    info!(text, "Echoing message back");
    Ok(Flow::Halt)
}

/// Catch-all for events no earlier entry claimed.
fn unhandled(event: &Value) -> Flow {
    info!(%event, "No entry claimed the event");
    Flow::Halt
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let processor = Processor::builder()
        .with(Entry::named("trace").always().middleware(TraceMiddleware::named("echo-demo")))
        .with(
            Entry::named("welcome")
                .when(field_eq("type", "bot_started"))
                .when((
                    field_eq("type", "message_created"),
                    pointer_eq("/message/text", "/start"),
                ))
                .handler(welcome),
        )
        .with(
            Entry::named("echo")
                .when(field_eq("type", "message_created"))
                .handler_async(echo),
        )
        .with(Entry::named("fallback").handler(unhandled))
        .build();

    info!(entries = processor.registry().len(), "Echo bot starting");

    for line in FEED {
        let event: Value = serde_json::from_str(line)?;
        if let Err(err) = processor.process(event).await {
            error!(error = %err, "Event processing failed");
        }
    }

    Ok(())
}
