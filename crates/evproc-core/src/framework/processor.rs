//! The dispatcher: walks a registry for one event at a time.
//!
//! [`Processor::process`] is the single entry point. For each incoming event
//! it walks the registry in declaration order, skipping entries whose
//! conditions do not match. A handler's return value decides whether the walk
//! continues ([`Flow::Continue`]) or ends right there ([`Flow::Halt`]); a
//! middleware wraps every entry declared after it, entering before them and
//! exiting after they finish, including when they fail.
//!
//! Middleware nesting falls out of recursion: the walk restarts at the next
//! position as the middleware's body, so the first-declared middleware is
//! entered first and exited last, and a failure anywhere in the wrapped
//! remainder unwinds through the enclosing exits in LIFO order, each exit
//! free to suppress it.
//!
//! ```rust,ignore
//! let processor = Processor::builder()
//!     .with(Entry::named("audit").always().middleware(Audit::new()))
//!     .with(
//!         Entry::named("greet")
//!             .when(|event: &Value| event["type"] == "message_created")
//!             .handler(greet),
//!     )
//!     .with(Entry::named("fallback").handler(log_unhandled))
//!     .build();
//!
//! processor.process(event).await?;
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{Instrument, Level, debug, span, trace};

use crate::foundation::error::BoxError;
use crate::foundation::event::Event;
use crate::foundation::flow::Flow;
use crate::framework::registry::{Body, Entry, Registry};

/// The dispatch engine for one registry.
///
/// A processor is cheap to clone (entries are shared behind `Arc`s) and its
/// registry is immutable after [`build`](ProcessorBuilder::build), so one
/// processor can serve any number of concurrent [`process`](Self::process)
/// calls, each for its own event.
pub struct Processor<E> {
    registry: Arc<Registry<E>>,
}

impl<E: Event> Processor<E> {
    /// Opens a builder for a new processor.
    pub fn builder() -> ProcessorBuilder<E> {
        ProcessorBuilder::new()
    }

    /// Returns the registry this processor dispatches over.
    pub fn registry(&self) -> &Registry<E> {
        &self.registry
    }

    /// Dispatches one event through the chain.
    ///
    /// Entries are visited in declaration order. Whether the walk ran to the
    /// end of the registry or a handler halted it early, the outcome is
    /// `Ok(())`. `Err` carries the failure of the first failing entry that no
    /// enclosing middleware suppressed, unwrapped and unchanged.
    pub async fn process(&self, event: E) -> Result<(), BoxError> {
        let event = Arc::new(event);
        let span = span!(Level::DEBUG, "dispatch");
        self.run_from(0, &event).instrument(span).await
    }

    /// Walks the registry from `index` to the end.
    ///
    /// This is the recursive core: a matching middleware runs the remainder
    /// of the walk as its body, which is what nests enter/exit pairs
    /// last-in-first-out around a remainder of unknown length.
    fn run_from<'a>(
        &'a self,
        index: usize,
        event: &'a Arc<E>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let mut cursor = index;
            while let Some(entry) = self.registry.get(cursor) {
                if !entry.matches(event) {
                    trace!(
                        entry = entry.name().unwrap_or("unnamed"),
                        index = cursor,
                        "Conditions not met, skipping entry"
                    );
                    cursor += 1;
                    continue;
                }
                match entry.body() {
                    Body::SyncHandler(body) => {
                        trace!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Invoking handler"
                        );
                        if body(event)? == Flow::Halt {
                            debug!(
                                entry = entry.name().unwrap_or("unnamed"),
                                index = cursor,
                                "Handler halted the chain"
                            );
                            return Ok(());
                        }
                    }
                    Body::AsyncHandler(body) => {
                        trace!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Invoking handler"
                        );
                        if body(Arc::clone(event)).await? == Flow::Halt {
                            debug!(
                                entry = entry.name().unwrap_or("unnamed"),
                                index = cursor,
                                "Handler halted the chain"
                            );
                            return Ok(());
                        }
                    }
                    Body::SyncMiddleware(middleware) => {
                        debug!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Entering middleware"
                        );
                        let guard = middleware.enter_dyn(event)?;
                        let outcome = self.run_from(cursor + 1, event).await;
                        let result = middleware.exit_dyn(event, guard, outcome.err());
                        debug!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Exited middleware"
                        );
                        return result;
                    }
                    Body::AsyncMiddleware(middleware) => {
                        debug!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Entering middleware"
                        );
                        let guard = middleware.enter_dyn(event).await?;
                        let outcome = self.run_from(cursor + 1, event).await;
                        let result = middleware.exit_dyn(event, guard, outcome.err()).await;
                        debug!(
                            entry = entry.name().unwrap_or("unnamed"),
                            index = cursor,
                            "Exited middleware"
                        );
                        return result;
                    }
                }
                cursor += 1;
            }
            Ok(())
        })
    }
}

impl<E> Clone for Processor<E> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry) }
    }
}

impl<E> fmt::Debug for Processor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("entries", &self.registry.len())
            .finish()
    }
}

// ============================================================================
// ProcessorBuilder
// ============================================================================

/// Builder for a [`Processor`].
pub struct ProcessorBuilder<E> {
    registry: Registry<E>,
}

impl<E: Event> ProcessorBuilder<E> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    /// Appends an entry. Entries dispatch in the order they are added.
    pub fn with(mut self, entry: Entry<E>) -> Self {
        self.registry.push(entry);
        self
    }

    /// Appends an entry through a mutable reference, for loop-driven setup.
    pub fn add(&mut self, entry: Entry<E>) {
        self.registry.push(entry);
    }

    /// Finalizes the registry and returns the processor.
    pub fn build(self) -> Processor<E> {
        Processor { registry: Arc::new(self.registry) }
    }
}

impl<E: Event> Default for ProcessorBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::*;
    use crate::framework::middleware::{AsyncMiddleware, Middleware};

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[derive(Debug, thiserror::Error)]
    #[error("handler exploded")]
    struct Exploded;

    /// Middleware that records its enter/exit and optionally swallows
    /// failures.
    struct Recorder {
        tag: &'static str,
        log: Log,
        suppress: bool,
    }

    impl Middleware<Value> for Recorder {
        type Guard = ();

        fn enter(&self, _event: &Value) -> Result<(), BoxError> {
            self.log.lock().push(format!("{}.enter", self.tag));
            Ok(())
        }

        fn exit(
            &self,
            _event: &Value,
            _guard: (),
            failure: Option<BoxError>,
        ) -> Result<(), BoxError> {
            self.log.lock().push(match &failure {
                Some(_) => format!("{}.exit(failure)", self.tag),
                None => format!("{}.exit", self.tag),
            });
            match failure {
                Some(err) if !self.suppress => Err(err),
                _ => Ok(()),
            }
        }
    }

    fn recording_handler(tag: &'static str, log: &Log, flow: Flow) -> Entry<Value> {
        let log = Arc::clone(log);
        Entry::named(tag).always().handler(move |_: &Value| {
            log.lock().push(tag.to_string());
            flow
        })
    }

    #[tokio::test]
    async fn entries_run_in_declaration_order() {
        let log = log();
        let processor = Processor::builder()
            .with(recording_handler("first", &log, Flow::Continue))
            .with(recording_handler("second", &log, Flow::Continue))
            .with(recording_handler("third", &log, Flow::Continue))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn halting_handler_stops_later_entries() {
        let log = log();
        let gate_log = Arc::clone(&log);
        let processor = Processor::builder()
            .with(recording_handler("a", &log, Flow::Continue))
            .with(
                Entry::named("b")
                    .when(|event: &Value| event.get("x").is_some())
                    .handler(move |_: &Value| {
                        gate_log.lock().push("b".into());
                        Flow::Halt
                    }),
            )
            .with(recording_handler("c", &log, Flow::Continue))
            .build();

        // With "x" present, b fires and halts before c.
        processor.process(json!({"x": 1})).await.unwrap();
        assert_eq!(*log.lock(), ["a", "b"]);

        // Without it, b is skipped and its halt is never considered.
        log.lock().clear();
        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["a", "c"]);
    }

    #[tokio::test]
    async fn halt_stops_before_later_conditions_are_evaluated() {
        let probes = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&probes);
        let processor = Processor::builder()
            .with(Entry::named("stop").always().handler(|_: &Value| Flow::Halt))
            .with(
                Entry::named("later")
                    .when(move |_: &Value| {
                        probe.fetch_add(1, Ordering::SeqCst);
                        true
                    })
                    .handler(|_: &Value| Flow::Continue),
            )
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn or_groups_fall_through_to_later_groups() {
        let log = log();
        let entry_log = Arc::clone(&log);
        let processor = Processor::builder()
            .with(
                Entry::named("either")
                    .when(|event: &Value| event.get("missing").is_some())
                    .when(|event: &Value| event.get("present").is_some())
                    .handler(move |_: &Value| {
                        entry_log.lock().push("either".into());
                        Flow::Halt
                    }),
            )
            .build();

        processor.process(json!({"present": true})).await.unwrap();
        assert_eq!(*log.lock(), ["either"]);
    }

    #[tokio::test]
    async fn middleware_nests_around_the_remainder() {
        let log = log();
        let processor = Processor::builder()
            .with(Entry::named("outer").always().middleware(Recorder {
                tag: "outer",
                log: Arc::clone(&log),
                suppress: false,
            }))
            .with(Entry::named("inner").always().middleware(Recorder {
                tag: "inner",
                log: Arc::clone(&log),
                suppress: false,
            }))
            .with(recording_handler("handler", &log, Flow::Continue))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(
            *log.lock(),
            ["outer.enter", "inner.enter", "handler", "inner.exit", "outer.exit"]
        );
    }

    #[tokio::test]
    async fn failure_unwinds_through_exits_in_lifo_order() {
        let log = log();
        let processor = Processor::builder()
            .with(Entry::named("outer").always().middleware(Recorder {
                tag: "outer",
                log: Arc::clone(&log),
                suppress: false,
            }))
            .with(Entry::named("inner").always().middleware(Recorder {
                tag: "inner",
                log: Arc::clone(&log),
                suppress: false,
            }))
            .with(Entry::named("bomb").always().handler(|_: &Value| Err::<Flow, _>(Exploded)))
            .build();

        let err = processor.process(json!({})).await.unwrap_err();
        assert!(err.downcast_ref::<Exploded>().is_some());
        assert_eq!(
            *log.lock(),
            ["outer.enter", "inner.enter", "inner.exit(failure)", "outer.exit(failure)"]
        );
    }

    #[tokio::test]
    async fn suppressing_middleware_completes_the_dispatch() {
        let log = log();
        let processor = Processor::builder()
            .with(Entry::named("shield").always().middleware(Recorder {
                tag: "shield",
                log: Arc::clone(&log),
                suppress: true,
            }))
            .with(Entry::named("bomb").always().handler(|_: &Value| Err::<Flow, _>(Exploded)))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["shield.enter", "shield.exit(failure)"]);
    }

    #[tokio::test]
    async fn halt_inside_middleware_exits_cleanly() {
        let log = log();
        let processor = Processor::builder()
            .with(Entry::named("wrap").always().middleware(Recorder {
                tag: "wrap",
                log: Arc::clone(&log),
                suppress: false,
            }))
            .with(recording_handler("stopper", &log, Flow::Halt))
            .with(recording_handler("after", &log, Flow::Continue))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["wrap.enter", "stopper", "wrap.exit"]);
    }

    #[tokio::test]
    async fn skipped_middleware_neither_enters_nor_exits() {
        let log = log();
        let processor = Processor::builder()
            .with(
                Entry::named("gated")
                    .when(|event: &Value| event.get("trace").is_some())
                    .middleware(Recorder {
                        tag: "gated",
                        log: Arc::clone(&log),
                        suppress: false,
                    }),
            )
            .with(recording_handler("handler", &log, Flow::Continue))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["handler"]);
    }

    struct FailingEnter {
        log: Log,
    }

    impl Middleware<Value> for FailingEnter {
        type Guard = ();

        fn enter(&self, _event: &Value) -> Result<(), BoxError> {
            self.log.lock().push("enter".into());
            Err(Box::new(Exploded))
        }

        fn exit(
            &self,
            _event: &Value,
            _guard: (),
            _failure: Option<BoxError>,
        ) -> Result<(), BoxError> {
            self.log.lock().push("exit".into());
            Ok(())
        }
    }

    #[tokio::test]
    async fn enter_failure_skips_exit_and_the_remainder() {
        let log = log();
        let processor = Processor::builder()
            .with(
                Entry::named("broken")
                    .always()
                    .middleware(FailingEnter { log: Arc::clone(&log) }),
            )
            .with(recording_handler("after", &log, Flow::Continue))
            .build();

        let err = processor.process(json!({})).await.unwrap_err();
        assert!(err.downcast_ref::<Exploded>().is_some());
        assert_eq!(*log.lock(), ["enter"]);
    }

    #[tokio::test]
    async fn async_handlers_follow_the_same_contract() {
        let log = log();
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        let processor = Processor::builder()
            .with(Entry::named("first").always().handler_async(move |_: Arc<Value>| {
                let log = Arc::clone(&first);
                async move {
                    log.lock().push("first".into());
                    true
                }
            }))
            .with(Entry::named("second").always().handler_async(move |_: Arc<Value>| {
                let log = Arc::clone(&second);
                async move {
                    log.lock().push("second".into());
                    false
                }
            }))
            .with(recording_handler("third", &log, Flow::Continue))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["first", "second"]);
    }

    struct AsyncShield {
        log: Log,
    }

    #[async_trait]
    impl AsyncMiddleware<Value> for AsyncShield {
        type Guard = &'static str;

        async fn enter(&self, _event: &Value) -> Result<&'static str, BoxError> {
            self.log.lock().push("shield.enter".into());
            Ok("token")
        }

        async fn exit(
            &self,
            _event: &Value,
            guard: &'static str,
            failure: Option<BoxError>,
        ) -> Result<(), BoxError> {
            assert_eq!(guard, "token");
            self.log.lock().push(match failure {
                Some(_) => "shield.exit(failure)".into(),
                None => "shield.exit".into(),
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn async_middleware_carries_its_guard_and_suppresses() {
        let log = log();
        let processor = Processor::builder()
            .with(
                Entry::named("shield")
                    .always()
                    .middleware_async(AsyncShield { log: Arc::clone(&log) }),
            )
            .with(Entry::named("bomb").always().handler(|_: &Value| Err::<Flow, _>(Exploded)))
            .build();

        processor.process(json!({})).await.unwrap();
        assert_eq!(*log.lock(), ["shield.enter", "shield.exit(failure)"]);
    }

    #[tokio::test]
    async fn empty_registry_completes_immediately() {
        let processor = Processor::<Value>::builder().build();
        processor.process(json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_dispatches_share_one_registry() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let processor = Processor::builder()
            .with(Entry::named("count").always().handler(move |_: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Flow::Halt
            }))
            .build();

        let clone = processor.clone();
        let (a, b) =
            tokio::join!(processor.process(json!({"n": 1})), clone.process(json!({"n": 2})));
        a.unwrap();
        b.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
