//! Chain-continuation decisions.
//!
//! Every handler invocation ends in a [`Flow`]: `Continue` keeps the walk
//! going, `Halt` ends the dispatch right there as a normal completion.
//! Handlers rarely name the enum directly. [`IntoFlow`] maps ordinary return
//! shapes onto it, so `bool`, `Option` and `Result` returning bodies all
//! work unchanged.

use crate::foundation::error::BoxError;

/// Outcome of a handler invocation: whether later entries still get to see
/// the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking the registry; later entries may handle the event too.
    Continue,
    /// The event is fully handled; stop the dispatch without an error.
    Halt,
}

/// Conversion from a handler's return value into a continuation decision.
///
/// The mapping follows the truthiness contract of the chain:
///
/// - [`Flow`] passes through unchanged.
/// - `true` continues, `false` halts.
/// - `()` halts: a body with no return value means "handled, stop here".
///   Return `true` or [`Flow::Continue`] to let later entries run.
/// - `Option` delegates to its value; `None` halts.
/// - `Result` delegates on `Ok`; `Err` becomes a dispatch failure carrying
///   the original error.
pub trait IntoFlow {
    /// Converts `self` into a continuation decision or a failure.
    fn into_flow(self) -> Result<Flow, BoxError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(self)
    }
}

impl IntoFlow for bool {
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(if self { Flow::Continue } else { Flow::Halt })
    }
}

impl IntoFlow for () {
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(Flow::Halt)
    }
}

impl<T: IntoFlow> IntoFlow for Option<T> {
    fn into_flow(self) -> Result<Flow, BoxError> {
        match self {
            Some(value) => value.into_flow(),
            None => Ok(Flow::Halt),
        }
    }
}

impl<T: IntoFlow, E: Into<BoxError>> IntoFlow for Result<T, E> {
    fn into_flow(self) -> Result<Flow, BoxError> {
        match self {
            Ok(value) => value.into_flow(),
            Err(err) => Err(err.into()),
        }
    }
}
