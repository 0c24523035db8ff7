//! Event marker for dispatched payloads.
//!
//! The engine never reads an event's contents. Predicates and handler bodies
//! are the only code that interprets the payload, so [`Event`] only pins down
//! the thread-safety bounds needed to share one event across the frames of a
//! single dispatch call.

/// Marker trait for event payloads.
///
/// Blanket-implemented for every `Send + Sync + 'static` type, so anything
/// from a `serde_json::Value` to a hand-rolled struct can be dispatched
/// without an explicit impl.
pub trait Event: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Event for T {}
