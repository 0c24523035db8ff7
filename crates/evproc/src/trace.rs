//! Chain observation middleware.

use std::time::Instant;

use tracing::debug;

use evproc_core::{BoxError, Event, Middleware};

/// Middleware that logs the chain segment it wraps: one line on enter, one on
/// exit with the elapsed time and the failure, if any.
///
/// `TraceMiddleware` never suppresses failures. Whatever the wrapped chain
/// raised keeps propagating after it is logged. Register it first (and
/// unconditionally) to observe the whole chain:
///
/// ```rust,ignore
/// let processor = Processor::builder()
///     .with(Entry::named("trace").always().middleware(TraceMiddleware::named("ingest")))
///     .with(Entry::named("work").when(is_job).handler_async(run_job))
///     .build();
/// ```
pub struct TraceMiddleware {
    label: Option<String>,
}

impl TraceMiddleware {
    /// Creates an unlabeled trace middleware.
    pub fn new() -> Self {
        Self { label: None }
    }

    /// Creates a trace middleware whose log lines carry `label`.
    pub fn named(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()) }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("unnamed")
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Middleware<E> for TraceMiddleware {
    type Guard = Instant;

    fn enter(&self, _event: &E) -> Result<Instant, BoxError> {
        debug!(chain = self.label(), "Chain segment started");
        Ok(Instant::now())
    }

    fn exit(
        &self,
        _event: &E,
        started: Instant,
        failure: Option<BoxError>,
    ) -> Result<(), BoxError> {
        let elapsed = started.elapsed();
        match failure {
            Some(err) => {
                debug!(chain = self.label(), ?elapsed, error = %err, "Chain segment failed");
                Err(err)
            }
            None => {
                debug!(chain = self.label(), ?elapsed, "Chain segment completed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use evproc_core::{Entry, Flow, Processor};
    use serde_json::{Value, json};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("downstream unavailable")]
    struct Downstream;

    #[tokio::test]
    async fn wraps_a_chain_without_changing_its_outcome() {
        let processor = Processor::builder()
            .with(Entry::named("trace").always().middleware(TraceMiddleware::named("test")))
            .with(Entry::named("ok").always().handler(|_: &Value| Flow::Halt))
            .build();

        processor.process(json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn never_suppresses_failures() {
        let processor = Processor::builder()
            .with(Entry::named("trace").always().middleware(TraceMiddleware::new()))
            .with(Entry::named("bomb").always().handler(|_: &Value| Err::<Flow, _>(Downstream)))
            .build();

        let err = processor.process(json!({})).await.unwrap_err();
        assert!(err.downcast_ref::<Downstream>().is_some());
    }
}
