//! Error currency of the dispatch engine.

/// A boxed error type for dynamic error handling.
///
/// Failures raised by handler and middleware bodies travel through the chain
/// as the type-erased original: the engine never wraps, retries, or replaces
/// them. A middleware that wants to react to a concrete failure can
/// `downcast_ref` on the value its exit receives.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
