//! # Evproc Core
//!
//! The dispatch engine of the evproc event processing framework.
//!
//! Consumers declare a chain of entries, plain handlers and middlewares, each
//! gated by boolean predicates over the incoming event. For every dispatched
//! event the engine decides which entries fire, in what order, and how
//! control and failures flow between them.
//!
//! ## Architecture Layers
//!
//! Evproc Core is organized into two architectural layers:
//!
//! ### Foundation Layer
//! Shared vocabulary with no engine logic:
//! - **Event**: marker trait pinning the thread-safety bounds of payloads
//! - **Flow / IntoFlow**: continuation decisions and the return-value
//!   conversions onto them
//! - **BoxError**: the type-erased error failures travel as
//!
//! ### Framework Layer
//! The dispatch pipeline built on the foundation:
//! - **Predicate / ConditionGroup**: boolean gates over events, AND within a
//!   group, OR across an entry's groups
//! - **Entry / Registry**: one registered body with its gates, held in an
//!   append-only, declaration-ordered sequence
//! - **Middleware / AsyncMiddleware**: enter/exit hooks wrapped around the
//!   remainder of the chain
//! - **Processor**: the walk itself
//!
//! ## Dispatch Contract
//!
//! ```text
//! event ──▶ middleware A ──▶ handler B ──▶ handler C ──▶ end of registry
//!            enter                │                          │
//!              └──── exit ◀───────┴── (halt or failure) ◀────┘
//! ```
//!
//! - Entries run strictly in declaration order; whether each one runs is
//!   decided by its condition groups.
//! - A handler's return value is mapped through [`IntoFlow`]; a falsy value
//!   ([`Flow::Halt`]) ends the dispatch as a normal completion.
//! - A middleware wraps everything declared after it: entered before, exited
//!   after, on every path out, with the chance to observe or suppress a
//!   propagating failure.
//!
//! ## Example
//!
//! ```rust,ignore
//! use evproc_core::prelude::*;
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let processor = Processor::builder()
//!         .with(
//!             Entry::named("greet")
//!                 .when(|event: &Value| event["type"] == "message_created")
//!                 .handler(|_: &Value| {
//!                     println!("hello!");
//!                     Flow::Continue
//!                 }),
//!         )
//!         .with(Entry::named("fallback").handler(|_: &Value| Flow::Halt))
//!         .build();
//!
//!     processor.process(json!({"type": "message_created"})).await
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;

// Re-export foundation types
pub use foundation::{BoxError, Event, Flow, IntoFlow};

// Re-export framework types
pub use framework::{
    AsyncMiddleware, ConditionGroup, Entry, EntryBuilder, EntryKind, IntoConditionGroup,
    Middleware, Predicate, Processor, ProcessorBuilder, Registry,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::{BoxError, Event, Flow, IntoFlow};
    pub use super::framework::{
        AsyncMiddleware, ConditionGroup, Entry, EntryBuilder, EntryKind, Middleware, Predicate,
        Processor, ProcessorBuilder, Registry,
    };
}
