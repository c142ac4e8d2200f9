//! Dependency Tracker
//!
//! The tracker records which derived computation is currently running.
//! This enables automatic dependency discovery: when a store is read, it
//! can register the running computation as a subscriber without the caller
//! wiring anything up.
//!
//! # Implementation
//!
//! We use a thread-local stack of active computations. When a derived
//! evaluation begins, it pushes itself onto the stack; when it completes,
//! the entry is popped. The top of the stack is the computation that any
//! store read should attach to.
//!
//! Each entry carries the computation's identity plus the callback that
//! re-executes its body, so a store can store that callback directly as a
//! subscriber.
//!
//! # Cycle detection
//!
//! Before pushing, `enter` scans the stack for the same identity. A hit
//! means the computation's body caused its own re-entry, through any chain
//! of store writes and reads, before the first invocation finished. That
//! evaluation fails with `StoreError::CircularDependency` instead of
//! recursing without bound.
//!
//! The thread-local design also means each thread is its own reactive
//! root: no synchronization guards the stack, and the cycle check cannot
//! be corrupted by another thread's evaluations.

use std::cell::RefCell;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::StoreError;

use super::subscriber::SubscriberId;

/// Callback that re-executes a derived computation's body.
pub(crate) type RerunFn = Arc<dyn Fn() -> Result<(), StoreError> + Send + Sync>;

/// An entry in the tracker stack: one in-flight derived evaluation.
#[derive(Clone)]
pub(crate) struct TrackedComputation {
    /// Identity of the running computation.
    pub(crate) id: SubscriberId,
    /// Hook a store registers to re-run the computation on change.
    pub(crate) rerun: RerunFn,
}

thread_local! {
    /// Stack of currently evaluating computations, innermost last.
    ///
    /// Derivations rarely nest more than a few levels deep, so the stack
    /// stays inline in the common case.
    static TRACKER_STACK: RefCell<SmallVec<[TrackedComputation; 4]>> =
        RefCell::new(SmallVec::new());
}

/// Guard for one tracked evaluation.
///
/// Obtained from [`Tracker::enter`]; pops the stack entry when dropped.
/// Dropping on every exit path, including early returns and panics, is what
/// keeps the stack from leaking an entry after a failed evaluation.
#[derive(Debug)]
pub struct Tracker {
    id: SubscriberId,
}

impl Tracker {
    /// Push a computation onto the tracker stack.
    ///
    /// Fails with [`StoreError::CircularDependency`] if `id` is already
    /// anywhere on the stack, which means the computation re-entered itself
    /// before completing.
    pub(crate) fn enter(id: SubscriberId, rerun: RerunFn) -> Result<Self, StoreError> {
        TRACKER_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|entry| entry.id == id) {
                tracing::debug!(computation = ?id, "circular dependency detected");
                return Err(StoreError::CircularDependency(id));
            }
            stack.push(TrackedComputation { id, rerun });
            Ok(())
        })?;

        Ok(Self { id })
    }

    /// Check if a computation is currently being tracked on this thread.
    pub fn is_active() -> bool {
        TRACKER_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of nested evaluations currently on the stack.
    pub fn depth() -> usize {
        TRACKER_STACK.with(|stack| stack.borrow().len())
    }

    /// The innermost running computation, if any.
    ///
    /// Stores call this on every read to decide whether to auto-subscribe.
    pub(crate) fn current() -> Option<TrackedComputation> {
        TRACKER_STACK.with(|stack| stack.borrow().last().cloned())
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        TRACKER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right entry. This helps catch bugs
            // where guards are dropped out of order.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.id, self.id,
                    "tracker mismatch: expected {:?}, got {:?}",
                    self.id, entry.id
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_rerun() -> RerunFn {
        Arc::new(|| Ok(()))
    }

    #[test]
    fn tracker_records_the_running_computation() {
        let id = SubscriberId::new();

        assert!(!Tracker::is_active());
        assert!(Tracker::current().is_none());

        {
            let _guard = Tracker::enter(id, noop_rerun()).unwrap();

            assert!(Tracker::is_active());
            assert_eq!(Tracker::current().unwrap().id, id);
        }

        // Stack is cleaned up after the guard drops.
        assert!(!Tracker::is_active());
        assert!(Tracker::current().is_none());
    }

    #[test]
    fn nested_evaluations_stack() {
        let outer = SubscriberId::new();
        let inner = SubscriberId::new();

        {
            let _outer_guard = Tracker::enter(outer, noop_rerun()).unwrap();
            assert_eq!(Tracker::current().unwrap().id, outer);
            assert_eq!(Tracker::depth(), 1);

            {
                let _inner_guard = Tracker::enter(inner, noop_rerun()).unwrap();
                assert_eq!(Tracker::current().unwrap().id, inner);
                assert_eq!(Tracker::depth(), 2);
            }

            // After the inner guard drops, the outer entry is current again.
            assert_eq!(Tracker::current().unwrap().id, outer);
        }

        assert_eq!(Tracker::depth(), 0);
    }

    #[test]
    fn reentry_fails_with_circular_dependency() {
        let id = SubscriberId::new();

        let _guard = Tracker::enter(id, noop_rerun()).unwrap();

        let err = Tracker::enter(id, noop_rerun()).unwrap_err();
        assert!(matches!(err, StoreError::CircularDependency(found) if found == id));

        // The failed enter must not have pushed anything.
        assert_eq!(Tracker::depth(), 1);
    }

    #[test]
    fn reentry_is_detected_below_the_top() {
        let a = SubscriberId::new();
        let b = SubscriberId::new();

        let _a_guard = Tracker::enter(a, noop_rerun()).unwrap();
        let _b_guard = Tracker::enter(b, noop_rerun()).unwrap();

        // `a` is buried under `b` but still counts as running.
        let err = Tracker::enter(a, noop_rerun()).unwrap_err();
        assert!(err.is_circular());
        assert_eq!(Tracker::depth(), 2);
    }

    #[test]
    fn failed_evaluation_still_pops() {
        let id = SubscriberId::new();

        let result: Result<(), StoreError> = (|| {
            let _guard = Tracker::enter(id, noop_rerun())?;
            Err(StoreError::executor(std::io::Error::new(
                std::io::ErrorKind::Other,
                "body failed",
            )))
        })();

        assert!(result.is_err());
        assert!(!Tracker::is_active());
    }
}
