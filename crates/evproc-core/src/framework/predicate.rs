//! Predicates and the condition groups that gate entries.
//!
//! A [`Predicate`] is a boolean test over the event. Predicates are collected
//! into [`ConditionGroup`]s, which AND their members together; an entry then
//! ORs its groups (see
//! [`Entry::matches`](crate::framework::registry::Entry::matches)). Both
//! levels short-circuit: a group stops at its first false predicate, an entry
//! stops at its first fully-true group.

use std::fmt;
use std::sync::Arc;

use crate::foundation::event::Event;

/// A type-erased boolean test over an event.
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// An ordered sequence of predicates combined with AND semantics.
///
/// The empty group is universally true and represents an unconditional
/// registration.
pub struct ConditionGroup<E> {
    predicates: Vec<Predicate<E>>,
}

impl<E> ConditionGroup<E> {
    /// Creates an empty, always-true group.
    pub fn new() -> Self {
        Self { predicates: Vec::new() }
    }

    /// Creates a group from pre-built predicates.
    pub fn from_predicates(predicates: Vec<Predicate<E>>) -> Self {
        Self { predicates }
    }

    /// Appends one more predicate to the conjunction.
    pub fn and<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
        self
    }

    /// Returns the number of predicates in this group.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns `true` if this group has no predicates, i.e. matches any
    /// event.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluates the conjunction left to right, stopping at the first false
    /// predicate.
    pub fn matches(&self, event: &E) -> bool {
        self.predicates.iter().all(|predicate| predicate(event))
    }
}

impl<E> Default for ConditionGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ConditionGroup<E> {
    fn clone(&self) -> Self {
        Self { predicates: self.predicates.clone() }
    }
}

impl<E> fmt::Debug for ConditionGroup<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionGroup")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

// ============================================================================
// Conversions into condition groups
// ============================================================================

/// Conversion into a [`ConditionGroup`], accepted by
/// [`EntryBuilder::when`](crate::framework::registry::EntryBuilder::when).
///
/// Implemented for a single predicate closure, tuples of up to eight closures
/// (the tuple is the AND of its members), a `Vec<Predicate<E>>`, a ready-made
/// [`ConditionGroup`], and `()` (the empty, always-true group).
///
/// The `M` parameter is an inference marker that keeps the closure and tuple
/// implementations apart; callers never name it.
pub trait IntoConditionGroup<E: Event, M> {
    /// Converts `self` into a condition group.
    fn into_group(self) -> ConditionGroup<E>;
}

impl<E: Event> IntoConditionGroup<E, ()> for ConditionGroup<E> {
    fn into_group(self) -> ConditionGroup<E> {
        self
    }
}

impl<E: Event> IntoConditionGroup<E, ()> for Vec<Predicate<E>> {
    fn into_group(self) -> ConditionGroup<E> {
        ConditionGroup::from_predicates(self)
    }
}

impl<E: Event> IntoConditionGroup<E, ()> for () {
    fn into_group(self) -> ConditionGroup<E> {
        ConditionGroup::new()
    }
}

impl<E, F> IntoConditionGroup<E, (F,)> for F
where
    E: Event,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    fn into_group(self) -> ConditionGroup<E> {
        ConditionGroup::from_predicates(vec![Arc::new(self) as Predicate<E>])
    }
}

/// Macro to generate `IntoConditionGroup` implementations for predicate
/// tuples of different arities.
macro_rules! impl_into_condition_group {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        impl<E, $($ty,)*> IntoConditionGroup<E, ($($ty,)*)> for ($($ty,)*)
        where
            E: Event,
            $( $ty: Fn(&E) -> bool + Send + Sync + 'static, )*
        {
            fn into_group(self) -> ConditionGroup<E> {
                let ($($ty,)*) = self;
                ConditionGroup::from_predicates(vec![$( Arc::new($ty) as Predicate<E>, )*])
            }
        }
    };
}

impl_into_condition_group!(P1);
impl_into_condition_group!(P1, P2);
impl_into_condition_group!(P1, P2, P3);
impl_into_condition_group!(P1, P2, P3, P4);
impl_into_condition_group!(P1, P2, P3, P4, P5);
impl_into_condition_group!(P1, P2, P3, P4, P5, P6);
impl_into_condition_group!(P1, P2, P3, P4, P5, P6, P7);
impl_into_condition_group!(P1, P2, P3, P4, P5, P6, P7, P8);
