//! Foundation layer - shared vocabulary of the engine.
//!
//! This module contains the types everything else builds on:
//! - Event marker pinning the thread-safety bounds of payloads
//! - Flow decisions and the return-value conversions onto them
//! - The boxed error type failures travel as

pub mod error;
pub mod event;
pub mod flow;

pub use error::BoxError;
pub use event::Event;
pub use flow::{Flow, IntoFlow};
