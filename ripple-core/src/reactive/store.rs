//! Store Implementation
//!
//! A Store is the fundamental reactive primitive. It holds a value and
//! notifies registered subscribers when that value changes.
//!
//! # How Stores Work
//!
//! 1. When a store is read while a derived computation is evaluating, the
//!    store registers that computation as a subscriber.
//!
//! 2. When a store's value changes, all subscribers are invoked with the
//!    new and old values, in registration order.
//!
//! 3. Writes are equality-gated: setting a value equal to the current one
//!    is a no-op and notifies nobody.
//!
//! # Notification model
//!
//! Notification is synchronous and unbounded: one write can trigger an
//! arbitrarily deep chain of subscriber re-executions on the calling
//! stack. No lock is held while callbacks run, so a callback may freely
//! read, write, subscribe to, or unsubscribe from any store, including the
//! one notifying it. A callback returning an error aborts the remainder of
//! that notification pass; the error travels back to the caller of the
//! write that started the cascade.
//!
//! # Memory Layout
//!
//! Each store consists of:
//! - A unique ID (8 bytes)
//! - The value slot, behind Arc
//! - An insertion-ordered map from subscriber ID to callback

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::StoreError;

use super::subscriber::{SubscriberId, Subscription};
use super::tracker::{TrackedComputation, Tracker};

/// Counter for generating unique store IDs.
static STORE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique store ID.
fn next_store_id() -> u64 {
    STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Subscriber callback: invoked with the new value and, except on the
/// immediate delivery at registration time, the previous value.
pub(crate) type NotifyFn<T> =
    Arc<dyn Fn(&T, Option<&T>) -> Result<(), StoreError> + Send + Sync>;

/// A reactive store holding a value of type T.
///
/// Stores are cheap handles; cloning one shares the underlying cell.
///
/// # Type Parameters
///
/// - `T`: The stored value type. `PartialEq` gates notification: a write
///   that compares equal to the current value changes nothing.
///
/// # Example
///
/// ```rust,ignore
/// let count = Store::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5)?;
/// ```
pub struct Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Unique identifier for this store.
    id: u64,

    /// The current value. `None` only between construction and first write
    /// of a derived store that has not produced its initial value yet;
    /// every store obtainable through the public API holds `Some`.
    value: Arc<RwLock<Option<T>>>,

    /// Registered subscribers, keyed by identity, in registration order.
    subscribers: Arc<RwLock<IndexMap<SubscriberId, NotifyFn<T>>>>,
}

impl<T> Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new store with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            id: next_store_id(),
            value: Arc::new(RwLock::new(Some(initial))),
            subscribers: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Create a store with no value yet.
    ///
    /// Used by derived-store constructors, which write the first value
    /// before handing the store out.
    pub(crate) fn uninitialized() -> Self {
        Self {
            id: next_store_id(),
            value: Arc::new(RwLock::new(None)),
            subscribers: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value.
    ///
    /// If a derived computation is currently evaluating on this thread,
    /// the computation is registered as a subscriber of this store, so a
    /// later write here re-runs it.
    pub fn get(&self) -> T {
        if let Some(computation) = Tracker::current() {
            self.attach_computation(computation);
        }

        self.current_value()
    }

    /// Get the current value without registering a dependency.
    ///
    /// Use this inside a derived computation to read a store the
    /// computation should not re-run for.
    pub fn get_untracked(&self) -> T {
        self.current_value()
    }

    fn current_value(&self) -> T {
        self.value
            .read()
            .expect("value lock poisoned")
            .clone()
            .expect("store read before first write")
    }

    /// Register the running computation as a subscriber.
    ///
    /// Keyed by the computation's identity, so the re-registration that
    /// happens on every re-run is idempotent.
    fn attach_computation(&self, computation: TrackedComputation) {
        let mut subscribers = self.subscribers.write().expect("subscriber lock poisoned");
        if !subscribers.contains_key(&computation.id) {
            let TrackedComputation { id, rerun } = computation;
            let notify: NotifyFn<T> = Arc::new(move |_: &T, _: Option<&T>| rerun());
            subscribers.insert(id, notify);
        }
    }

    /// Set a new value and notify subscribers.
    ///
    /// If `value` equals the current value nothing happens and nobody is
    /// notified. Otherwise the value is stored and every subscriber runs
    /// synchronously, in registration order, before this call returns.
    ///
    /// Returns the value now held by the store. Fails if a subscriber
    /// fails, including a derived computation downstream detecting a
    /// circular dependency.
    pub fn set(&self, value: T) -> Result<T, StoreError> {
        self.write(value)
    }

    /// Update the value using a function of the current value.
    ///
    /// Computes `f(&current)` and routes the result through the same
    /// equality-gated write path as [`set`](Store::set).
    pub fn update<F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let guard = self.value.read().expect("value lock poisoned");
            f(guard.as_ref().expect("store read before first write"))
        };
        self.write(next)
    }

    /// The single write path behind `set` and `update`.
    pub(crate) fn write(&self, new: T) -> Result<T, StoreError> {
        let old = {
            let mut guard = self.value.write().expect("value lock poisoned");
            if guard.as_ref() == Some(&new) {
                return Ok(new);
            }
            guard.replace(new.clone())
        };

        trace!(store = self.id, "value changed");
        self.notify_subscribers(&new, old.as_ref())?;

        Ok(new)
    }

    /// Invoke every subscriber registered at the start of this pass.
    ///
    /// The callback list is snapshotted and all locks released first:
    /// callbacks may re-enter this store. Subscribers added mid-pass see
    /// only later writes.
    fn notify_subscribers(&self, new: &T, old: Option<&T>) -> Result<(), StoreError> {
        let snapshot: Vec<NotifyFn<T>> = {
            let subscribers = self.subscribers.read().expect("subscriber lock poisoned");
            subscribers.values().cloned().collect()
        };

        trace!(store = self.id, subscribers = snapshot.len(), "notifying");
        for notify in snapshot {
            notify(new, old)?;
        }

        Ok(())
    }

    /// Register a subscriber callback.
    ///
    /// The callback is invoked once immediately with the current value and
    /// no previous value, synchronously, before this method returns. That
    /// immediate delivery is part of the contract: it is how a consumer
    /// learns the value it is starting from. Afterwards the callback runs
    /// on every change with `(new, Some(old))`.
    ///
    /// Returns a [`Subscription`] whose `dispose` removes the callback.
    pub fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&T, Option<&T>) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        let notify: NotifyFn<T> = Arc::new(move |new: &T, old: Option<&T>| {
            subscriber(new, old);
            Ok(())
        });

        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .insert(id, notify.clone());

        let current = self.current_value();
        notify(&current, None).expect("wrapped subscriber never fails");

        self.subscription(id)
    }

    /// Register a fallible subscriber callback.
    ///
    /// Behaves like [`subscribe`](Store::subscribe), but the callback may
    /// fail. If the immediate delivery fails, the registration is rolled
    /// back and the error returned, so the caller either holds a live
    /// subscription or none at all. A failure during a later notification
    /// pass propagates out of the write that triggered it.
    pub fn try_subscribe<F>(&self, subscriber: F) -> Result<Subscription, StoreError>
    where
        F: Fn(&T, Option<&T>) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        let notify: NotifyFn<T> = Arc::new(subscriber);

        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .insert(id, notify.clone());

        let current = self.current_value();
        if let Err(err) = notify(&current, None) {
            self.unsubscribe(id);
            return Err(err);
        }

        Ok(self.subscription(id))
    }

    /// Remove a subscriber by identity. No-op if absent.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .shift_remove(&id);
    }

    fn subscription(&self, id: SubscriberId) -> Subscription {
        let subscribers = Arc::downgrade(&self.subscribers);
        Subscription::new(
            id,
            Box::new(move || {
                if let Some(subscribers) = subscribers.upgrade() {
                    subscribers
                        .write()
                        .expect("subscriber lock poisoned")
                        .shift_remove(&id);
                }
            }),
        )
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("subscriber lock poisoned")
            .len()
    }
}

impl<T> Clone for Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for Store<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.value.read().expect("value lock poisoned");
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("value", &*value)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
