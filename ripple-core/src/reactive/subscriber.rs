//! Subscriber identity and subscription handles.
//!
//! A subscriber is any callback registered on a store, whether an external
//! observer added through `subscribe` or the re-run hook of a derived
//! computation. Identity is what matters: a store keys its callback map by
//! [`SubscriberId`], so registering the same computation twice is a no-op
//! and removal works without comparing closures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each subscriber (external callback or derived computation) gets a unique
/// ID when created. This ID is used as the registration key, which makes
/// repeated registration idempotent and removal possible by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer handle returned by `Store::subscribe`.
///
/// Calling [`dispose`](Subscription::dispose) removes the subscriber from
/// the store it was registered on. Dropping the handle without disposing it
/// leaves the subscriber registered; the store never removes callbacks on
/// its own.
pub struct Subscription {
    id: SubscriberId,
    remove: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, remove: Box<dyn FnOnce() + Send>) -> Self {
        Self { id, remove }
    }

    /// The identity of the subscriber this handle controls.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the subscriber from its store.
    ///
    /// No-op if the subscriber was already removed through
    /// `Store::unsubscribe`, or if the store is gone.
    pub fn dispose(self) {
        let Subscription { remove, .. } = self;
        remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn dispose_runs_the_removal_hook() {
        let removed = Arc::new(AtomicBool::new(false));
        let removed_clone = removed.clone();

        let subscription = Subscription::new(
            SubscriberId::new(),
            Box::new(move || {
                removed_clone.store(true, Ordering::SeqCst);
            }),
        );

        assert!(!removed.load(Ordering::SeqCst));
        subscription.dispose();
        assert!(removed.load(Ordering::SeqCst));
    }

    #[test]
    fn dropping_without_dispose_leaves_the_hook_unrun() {
        let removed = Arc::new(AtomicBool::new(false));
        let removed_clone = removed.clone();

        let subscription = Subscription::new(
            SubscriberId::new(),
            Box::new(move || {
                removed_clone.store(true, Ordering::SeqCst);
            }),
        );

        drop(subscription);
        assert!(!removed.load(Ordering::SeqCst));
    }
}
