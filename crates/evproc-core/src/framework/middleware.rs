//! Middleware entries that wrap the remainder of the chain.
//!
//! A middleware is the scoped-resource counterpart of a handler: its
//! [`enter`](Middleware::enter) runs before the entries declared after it,
//! and its [`exit`](Middleware::exit) runs after they finish, on every path
//! out (normal completion, a halted chain, or a propagating failure). State
//! that must survive from enter to exit travels through the `Guard`
//! associated type.
//!
//! Failure handling is explicit: `exit` receives the failure, if any, raised
//! by the wrapped part of the chain and decides its fate. Returning `Ok(())`
//! suppresses it and lets the dispatch complete normally; returning the
//! failure (or a replacement) keeps it propagating outward. The default
//! `exit` propagates.

use std::any::Any;

use async_trait::async_trait;

use crate::foundation::error::BoxError;
use crate::foundation::event::Event;

/// A synchronous middleware: enter/exit hooks around the rest of the chain.
///
/// # Example
///
/// ```rust,ignore
/// struct Recover;
///
/// impl<E: Event> Middleware<E> for Recover {
///     type Guard = ();
///
///     fn enter(&self, _event: &E) -> Result<(), BoxError> {
///         Ok(())
///     }
///
///     fn exit(&self, _event: &E, _guard: (), failure: Option<BoxError>) -> Result<(), BoxError> {
///         if let Some(err) = failure {
///             tracing::warn!(error = %err, "Recovered from a failing handler");
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Middleware<E: Event>: Send + Sync + 'static {
    /// State carried from `enter` to `exit`.
    type Guard: Send + 'static;

    /// Runs before the remainder of the chain. A failure here propagates
    /// immediately and `exit` is not called.
    fn enter(&self, event: &E) -> Result<Self::Guard, BoxError>;

    /// Runs after the remainder of the chain, on every exit path.
    ///
    /// `failure` carries the error the wrapped chain raised, if any.
    /// Returning `Ok(())` suppresses it; returning an error keeps the
    /// dispatch failing. The default implementation propagates.
    fn exit(
        &self,
        event: &E,
        guard: Self::Guard,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError> {
        let _ = (event, guard);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The asynchronous counterpart of [`Middleware`].
#[async_trait]
pub trait AsyncMiddleware<E: Event>: Send + Sync + 'static {
    /// State carried from `enter` to `exit`.
    type Guard: Send + 'static;

    /// Runs before the remainder of the chain. A failure here propagates
    /// immediately and `exit` is not called.
    async fn enter(&self, event: &E) -> Result<Self::Guard, BoxError>;

    /// Runs after the remainder of the chain, on every exit path.
    ///
    /// Same contract as [`Middleware::exit`].
    async fn exit(
        &self,
        event: &E,
        guard: Self::Guard,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError> {
        let _ = (event, guard);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Object-safe forms
// ============================================================================

/// Object-safe form of [`Middleware`] with the guard boxed, so the registry
/// can hold middlewares with different guard types side by side.
pub(crate) trait ErasedMiddleware<E: Event>: Send + Sync {
    fn enter_dyn(&self, event: &E) -> Result<Box<dyn Any + Send>, BoxError>;

    fn exit_dyn(
        &self,
        event: &E,
        guard: Box<dyn Any + Send>,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError>;
}

impl<E: Event, M: Middleware<E>> ErasedMiddleware<E> for M {
    fn enter_dyn(&self, event: &E) -> Result<Box<dyn Any + Send>, BoxError> {
        let guard = self.enter(event)?;
        Ok(Box::new(guard) as Box<dyn Any + Send>)
    }

    fn exit_dyn(
        &self,
        event: &E,
        guard: Box<dyn Any + Send>,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError> {
        // The engine only ever hands back the box our own enter_dyn produced.
        let Ok(guard) = guard.downcast::<M::Guard>() else {
            unreachable!("guard was produced by this middleware's enter");
        };
        self.exit(event, *guard, failure)
    }
}

/// Object-safe form of [`AsyncMiddleware`].
#[async_trait]
pub(crate) trait ErasedAsyncMiddleware<E: Event>: Send + Sync {
    async fn enter_dyn(&self, event: &E) -> Result<Box<dyn Any + Send>, BoxError>;

    async fn exit_dyn(
        &self,
        event: &E,
        guard: Box<dyn Any + Send>,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError>;
}

#[async_trait]
impl<E: Event, M: AsyncMiddleware<E>> ErasedAsyncMiddleware<E> for M {
    async fn enter_dyn(&self, event: &E) -> Result<Box<dyn Any + Send>, BoxError> {
        let guard = self.enter(event).await?;
        Ok(Box::new(guard) as Box<dyn Any + Send>)
    }

    async fn exit_dyn(
        &self,
        event: &E,
        guard: Box<dyn Any + Send>,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError> {
        let Ok(guard) = guard.downcast::<M::Guard>() else {
            unreachable!("guard was produced by this middleware's enter");
        };
        self.exit(event, *guard, failure).await
    }
}
