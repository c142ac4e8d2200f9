//! Producer-driven stores.
//!
//! `from` is the escape hatch for values that are not derived by reading
//! other stores: the producer gets the store handle once and decides for
//! itself when to write, including later, from a timer or a task. Nothing
//! here touches the dependency tracker, so reads inside a producer do not
//! subscribe to anything and no cycle guard applies.

use crate::error::StoreError;

use super::store::Store;

/// Build a store fed by a producer function.
///
/// The store is seeded with `initial`, then `executor` is called exactly
/// once, synchronously, with the store handle. The producer may write
/// immediately, subscribe to other stores, or clone the handle and write
/// later; late writes go through the ordinary write path.
///
/// # Example
///
/// ```rust,ignore
/// let ticks = from(|store| {
///     let store = store.clone();
///     spawn_timer(move || {
///         let _ = store.update(|t| t + 1);
///     });
/// }, 0);
/// ```
pub fn from<T, F>(executor: F, initial: T) -> Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: FnOnce(&Store<T>),
{
    let store = Store::new(initial);
    executor(&store);
    store
}

/// Build a producer-driven store from a fallible producer.
///
/// An error from the synchronous call propagates directly to the caller;
/// no store is returned.
pub fn try_from<T, F>(executor: F, initial: T) -> Result<Store<T>, StoreError>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: FnOnce(&Store<T>) -> Result<(), StoreError>,
{
    let store = Store::new(initial);
    executor(&store)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn from_keeps_the_initial_value_when_the_producer_is_idle() {
        let store = from(|_| {}, 7);
        assert_eq!(store.get(), 7);
    }

    #[test]
    fn from_producer_write_is_visible() {
        let store = from(
            |store: &Store<i32>| {
                store.set(99).unwrap();
            },
            0,
        );
        assert_eq!(store.get(), 99);
    }

    #[test]
    fn producer_runs_exactly_once() {
        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();

        let store = from(
            move |_: &Store<i32>| {
                runs_clone.fetch_add(1, Ordering::SeqCst);
            },
            0,
        );

        store.set(1).unwrap();
        store.set(2).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_writes_go_through_the_normal_path() {
        let mut feed = None;
        let store = from(
            |store: &Store<i32>| {
                // Stash a handle instead of writing now.
                feed = Some(store.clone());
            },
            0,
        );

        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();
        let _subscription = store.subscribe(move |_, _| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        // "Later": the producer writes well after construction.
        feed.unwrap().set(5).unwrap();
        assert_eq!(store.get(), 5);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn producer_reads_establish_no_dependencies() {
        let other = Store::new(1);

        let other_clone = other.clone();
        let store = from(
            move |store: &Store<i32>| {
                store.set(other_clone.get() * 2).unwrap();
            },
            0,
        );
        assert_eq!(store.get(), 2);

        // The producer read `other` outside any tracked evaluation, so
        // changing `other` does nothing here.
        other.set(10).unwrap();
        assert_eq!(store.get(), 2);
        assert_eq!(other.subscriber_count(), 0);
    }

    #[test]
    fn try_from_error_propagates() {
        let err = try_from::<i32, _>(
            |_| {
                Err(StoreError::executor(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "source unavailable",
                )))
            },
            0,
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::Executor(_)));
    }
}
