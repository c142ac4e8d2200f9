//! Derived stores.
//!
//! `computed` builds a store whose value is produced by re-running an
//! executor whenever any store it read during its previous run changes.
//!
//! # How It Works
//!
//! 1. At construction, the executor runs once inside a tracker entry. Every
//!    store read during that run registers the computation as a subscriber.
//!
//! 2. When any of those stores changes, the registered hook re-runs the
//!    executor inside a fresh tracker entry and writes the result into the
//!    output store, which notifies its own subscribers in turn.
//!
//! 3. Entering the tracker checks for re-entry: if the computation is
//!    already running, the evaluation fails with a circular dependency
//!    error instead of recursing.
//!
//! # Subscription lifetime
//!
//! Re-subscription is implicit and total per run: each run re-registers the
//! computation with whatever stores it reads, keyed by the computation's
//! identity, so repeats are no-ops. Stores read on an earlier run but not
//! the latest one keep the computation subscribed; a write to such a store
//! still re-runs the executor, which simply no longer reads it. Nothing
//! prunes those registrations.

use std::sync::Arc;

use tracing::trace;

use crate::error::StoreError;

use super::store::Store;
use super::subscriber::SubscriberId;
use super::tracker::{RerunFn, Tracker};

/// One derived computation: identity, body, and the store it writes.
struct Computation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    id: SubscriberId,
    executor: Box<dyn Fn() -> Result<T, StoreError> + Send + Sync>,
    output: Store<T>,
}

impl<T> Computation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Evaluate the executor once and publish the result.
    ///
    /// The tracker entry is dropped before the output write on every path,
    /// so downstream evaluations triggered by that write never see this
    /// computation as still running, and a failed executor leaves the
    /// tracker clean with the store's prior value retained.
    fn run(self: &Arc<Self>) -> Result<(), StoreError> {
        let this = Arc::clone(self);
        let rerun: RerunFn = Arc::new(move || this.run());

        let guard = Tracker::enter(self.id, rerun)?;
        trace!(computation = ?self.id, "evaluating");
        let result = (self.executor)();
        drop(guard);

        let value = result?;
        self.output.write(value)?;
        Ok(())
    }
}

/// Build a store computed from other stores.
///
/// The executor runs once, synchronously, before this function returns,
/// establishing the initial value and the initial subscription set. After
/// that it re-runs whenever any store it read on its most recent run
/// changes.
///
/// The returned store can be read and subscribed to like any other.
/// Writing to it from outside defeats the derivation and is not prevented,
/// only discouraged.
///
/// # Example
///
/// ```rust,ignore
/// let count = Store::new(1);
/// let doubled = computed({
///     let count = count.clone();
///     move || count.get() * 2
/// });
///
/// assert_eq!(doubled.get(), 2);
/// count.set(5)?;
/// assert_eq!(doubled.get(), 10);
/// ```
pub fn computed<T, F>(executor: F) -> Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    try_computed(move || Ok(executor()))
        .expect("infallible executor cannot fail its first evaluation")
}

/// Build a derived store from a fallible executor.
///
/// Behaves like [`computed`], except the executor may fail. A failure on
/// the initial run propagates out of this constructor and no store is
/// produced. A failure on a later run propagates out of the store write
/// that triggered it, and the derived store keeps its previous value.
///
/// A `StoreError` returned by a nested write inside the executor, such as
/// a circular dependency detected downstream, should be propagated with
/// `?` so it reaches the original caller intact.
pub fn try_computed<T, F>(executor: F) -> Result<Store<T>, StoreError>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> Result<T, StoreError> + Send + Sync + 'static,
{
    let computation = Arc::new(Computation {
        id: SubscriberId::new(),
        executor: Box::new(executor),
        output: Store::uninitialized(),
    });

    // Initial evaluation: seeds the value and the subscription set.
    computation.run()?;

    Ok(computation.output.clone())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
