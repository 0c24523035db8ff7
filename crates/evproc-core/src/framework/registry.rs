//! Entry descriptors and the registry that orders them.
//!
//! An [`Entry`] pairs one handler or middleware body with the condition
//! groups that gate it. Entries are built with [`EntryBuilder`]: open it with
//! [`Entry::named`] or [`Entry::anonymous`], add condition groups with
//! [`when`](EntryBuilder::when) / [`always`](EntryBuilder::always), then fix
//! the body with one of the four body methods. The body method chosen
//! determines the entry's [`EntryKind`].
//!
//! A [`Registry`] is an append-only sequence of entries. Each entry is
//! stamped with its position as it is appended, and dispatch walks the
//! entries in exactly that order, every time.
//!
//! # Condition semantics
//!
//! Each `when` call contributes one [`ConditionGroup`], the AND of its
//! predicates; an entry fires if any of its groups matches (OR across
//! groups). `always()` registers the entry unconditionally and must be its
//! only condition call. Combining it with anything else is a configuration
//! error and panics at build time, before any event is dispatched.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::foundation::error::BoxError;
use crate::foundation::event::Event;
use crate::foundation::flow::{Flow, IntoFlow};
use crate::framework::middleware::{
    AsyncMiddleware, ErasedAsyncMiddleware, ErasedMiddleware, Middleware,
};
use crate::framework::predicate::{ConditionGroup, IntoConditionGroup};

/// Classification of an entry, derived from its body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A body invoked at its own position; its return value decides whether
    /// the walk continues.
    Handler,
    /// A scoped body wrapped around every entry declared after it.
    Middleware,
}

/// The four body shapes an entry can carry.
pub(crate) enum Body<E> {
    SyncHandler(Arc<dyn Fn(&E) -> Result<Flow, BoxError> + Send + Sync>),
    AsyncHandler(Arc<dyn Fn(Arc<E>) -> BoxFuture<'static, Result<Flow, BoxError>> + Send + Sync>),
    SyncMiddleware(Arc<dyn ErasedMiddleware<E>>),
    AsyncMiddleware(Arc<dyn ErasedAsyncMiddleware<E>>),
}

impl<E> Body<E> {
    fn kind(&self) -> EntryKind {
        match self {
            Body::SyncHandler(_) | Body::AsyncHandler(_) => EntryKind::Handler,
            Body::SyncMiddleware(_) | Body::AsyncMiddleware(_) => EntryKind::Middleware,
        }
    }
}

impl<E> Clone for Body<E> {
    fn clone(&self) -> Self {
        match self {
            Body::SyncHandler(body) => Body::SyncHandler(Arc::clone(body)),
            Body::AsyncHandler(body) => Body::AsyncHandler(Arc::clone(body)),
            Body::SyncMiddleware(middleware) => Body::SyncMiddleware(Arc::clone(middleware)),
            Body::AsyncMiddleware(middleware) => Body::AsyncMiddleware(Arc::clone(middleware)),
        }
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One registered handler or middleware with its gating conditions.
pub struct Entry<E> {
    name: Option<String>,
    index: usize,
    groups: Vec<ConditionGroup<E>>,
    body: Body<E>,
}

impl<E: Event> Entry<E> {
    /// Opens a builder for an entry with a diagnostic name.
    ///
    /// The name shows up in tracing output and `Debug` formatting; it has no
    /// effect on dispatch.
    pub fn named(name: impl Into<String>) -> EntryBuilder<E> {
        EntryBuilder { name: Some(name.into()), groups: Vec::new(), unconditional: false }
    }

    /// Opens a builder for an entry without a name.
    pub fn anonymous() -> EntryBuilder<E> {
        EntryBuilder { name: None, groups: Vec::new(), unconditional: false }
    }
}

impl<E> Entry<E> {
    /// Returns the diagnostic name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the position stamped when the entry was appended to its
    /// registry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns whether this entry is a handler or a middleware.
    pub fn kind(&self) -> EntryKind {
        self.body.kind()
    }

    /// Returns the condition groups gating this entry.
    pub fn groups(&self) -> &[ConditionGroup<E>] {
        &self.groups
    }

    /// Evaluates the entry's gate: OR across groups, AND within each group,
    /// both short-circuiting.
    pub fn matches(&self, event: &E) -> bool {
        self.groups.iter().any(|group| group.matches(event))
    }

    pub(crate) fn body(&self) -> &Body<E> {
        &self.body
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl<E> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index,
            groups: self.groups.clone(),
            body: self.body.clone(),
        }
    }
}

impl<E> fmt::Debug for Entry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("kind", &self.body.kind())
            .field("groups", &self.groups.len())
            .finish()
    }
}

// ============================================================================
// EntryBuilder
// ============================================================================

/// Builder for an [`Entry`].
///
/// Condition calls accumulate groups in call order; a body call consumes the
/// builder and fixes the entry's kind. A builder with no condition call
/// produces an unconditional entry.
pub struct EntryBuilder<E> {
    name: Option<String>,
    groups: Vec<ConditionGroup<E>>,
    unconditional: bool,
}

impl<E: Event> EntryBuilder<E> {
    /// Appends one condition group: the AND of the given predicates.
    ///
    /// Accepts a single predicate closure, a tuple of closures, a
    /// `Vec<Predicate<E>>`, or a ready-made [`ConditionGroup`]. Repeated
    /// `when` calls are ORed together in call order.
    ///
    /// # Panics
    ///
    /// Panics if the entry was already registered unconditionally, via
    /// [`always`](Self::always) or an empty group: the unconditional group
    /// must be the entry's only one.
    pub fn when<G, M>(mut self, conditions: G) -> Self
    where
        G: IntoConditionGroup<E, M>,
    {
        let group = conditions.into_group();
        if group.is_empty() {
            return self.always();
        }
        assert!(
            !self.unconditional,
            "entry `{}`: an unconditional registration cannot be combined with condition groups",
            self.display_name(),
        );
        self.groups.push(group);
        self
    }

    /// Registers the entry unconditionally: it matches every event.
    ///
    /// # Panics
    ///
    /// Panics if any condition group was already added, or if the entry was
    /// already registered unconditionally: the unconditional group must be
    /// the entry's only one.
    pub fn always(mut self) -> Self {
        assert!(
            !self.unconditional && self.groups.is_empty(),
            "entry `{}`: an unconditional registration cannot be combined with condition groups",
            self.display_name(),
        );
        self.unconditional = true;
        self
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    fn finish(self, body: Body<E>) -> Entry<E> {
        let groups = if self.groups.is_empty() {
            // No condition call, or an explicit `always`: the single empty
            // group matches every event.
            vec![ConditionGroup::new()]
        } else {
            self.groups
        };
        Entry { name: self.name, index: 0, groups, body }
    }

    /// Fixes the body as a synchronous handler.
    ///
    /// The return value is mapped through [`IntoFlow`]: return `true` or
    /// [`Flow::Continue`] to keep the chain walking, anything falsy to end
    /// it, or an `Err` to fail the dispatch.
    pub fn handler<F, R>(self, body: F) -> Entry<E>
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        self.finish(Body::SyncHandler(Arc::new(move |event| body(event).into_flow())))
    }

    /// Fixes the body as an asynchronous handler.
    ///
    /// The body receives the event behind an `Arc` so its future can own a
    /// handle to it; the same [`IntoFlow`] mapping applies to the awaited
    /// return value.
    pub fn handler_async<F, Fut, R>(self, body: F) -> Entry<E>
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFlow + 'static,
    {
        self.finish(Body::AsyncHandler(Arc::new(move |event| {
            let fut = body(event);
            Box::pin(async move { fut.await.into_flow() })
        })))
    }

    /// Fixes the body as a synchronous middleware.
    pub fn middleware<M>(self, middleware: M) -> Entry<E>
    where
        M: Middleware<E>,
    {
        self.finish(Body::SyncMiddleware(Arc::new(middleware)))
    }

    /// Fixes the body as an asynchronous middleware.
    pub fn middleware_async<M>(self, middleware: M) -> Entry<E>
    where
        M: AsyncMiddleware<E>,
    {
        self.finish(Body::AsyncMiddleware(Arc::new(middleware)))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// An ordered, append-only sequence of entries.
///
/// The registry is built once, stamped in append order, and never reordered.
/// Dispatch reads it without locking, so one registry can serve any number of
/// concurrent dispatch calls.
pub struct Registry<E> {
    entries: Vec<Entry<E>>,
}

impl<E> Registry<E> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an entry, stamping it with its position.
    pub(crate) fn push(&mut self, mut entry: Entry<E>) {
        entry.set_index(self.entries.len());
        self.entries.push(entry);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entry was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Entry<E>> {
        self.entries.get(index)
    }

    /// Iterates the entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<E>> {
        self.entries.iter()
    }
}

impl<E> Clone for Registry<E> {
    fn clone(&self) -> Self {
        Self { entries: self.entries.clone() }
    }
}

impl<E> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
