//! Framework layer - registration and dispatch.
//!
//! This module contains the dispatch pipeline:
//! - Predicates and condition groups for gating entries
//! - Entry descriptors and the declaration-ordered registry
//! - Middleware traits for wrapping the remainder of a chain
//! - The processor that walks a registry for each event

pub mod middleware;
pub mod predicate;
pub mod processor;
pub mod registry;

pub use middleware::{AsyncMiddleware, Middleware};
pub use predicate::{ConditionGroup, IntoConditionGroup, Predicate};
pub use processor::{Processor, ProcessorBuilder};
pub use registry::{Entry, EntryBuilder, EntryKind, Registry};
