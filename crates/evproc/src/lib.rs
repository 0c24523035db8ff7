//! # Evproc
//!
//! A declarative, order-preserving event dispatch framework.
//!
//! ## Overview
//!
//! Evproc lets a consumer describe event handling as an ordered chain of
//! predicate-gated entries. Handlers run at their own position and decide
//! through their return value whether later entries still see the event;
//! middlewares wrap everything declared after them with enter/exit hooks that
//! run on every path out, including failures. Declaration order is the whole
//! contract: what fires, and in what order, can be read off the registration
//! site.
//!
//! This crate is the batteries-included surface: it re-exports the engine
//! from `evproc-core` and adds JSON predicate constructors and a ready-made
//! tracing middleware on top.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evproc::json::field_eq;
//! use evproc::prelude::*;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let processor = Processor::builder()
//!         .with(Entry::named("trace").always().middleware(TraceMiddleware::new()))
//!         .with(
//!             Entry::named("echo")
//!                 .when(field_eq("type", "message_created"))
//!                 .handler(|event: &Value| {
//!                     println!("{}", event["message"]["text"]);
//!                     Flow::Halt
//!                 }),
//!         )
//!         .build();
//!
//!     processor
//!         .process(serde_json::json!({"type": "message_created", "message": {"text": "hi"}}))
//!         .await
//! }
//! ```

pub use evproc_core as core;

pub mod json;
pub mod trace;

pub use evproc_core::{
    AsyncMiddleware, BoxError, ConditionGroup, Entry, EntryBuilder, EntryKind, Event, Flow,
    IntoConditionGroup, IntoFlow, Middleware, Predicate, Processor, ProcessorBuilder, Registry,
};
pub use trace::TraceMiddleware;

/// Prelude module for convenient imports.
pub mod prelude {
    // Engine - chain construction and dispatch
    pub use evproc_core::prelude::*;

    // Built-in middleware
    pub use crate::trace::TraceMiddleware;
}
