//! Error types for the reactive store system.
//!
//! All fallible operations in this crate return [`StoreError`]. The variants
//! mirror the three places a reactive update can go wrong:
//!
//! - A derived computation re-enters itself before finishing
//!   ([`StoreError::CircularDependency`]).
//! - An executor body fails ([`StoreError::Executor`]).
//! - A subscriber callback fails during a notification pass
//!   ([`StoreError::Subscriber`]).
//!
//! Errors always travel synchronously back to whoever triggered the write
//! (or ran the constructor), so the call site that caused a cascade is the
//! one that observes its failure.

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Boxed error payload carried by executor and subscriber failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by store writes and derived-store constructors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A computation's evaluation re-entered itself, directly or through a
    /// chain of store writes and reads, before its previous invocation
    /// completed.
    #[error("circular dependency: computation {0:?} re-entered before completing")]
    CircularDependency(SubscriberId),

    /// A derived-store executor failed. The store's prior value is retained.
    #[error("executor failed")]
    Executor(#[source] BoxError),

    /// A subscriber callback failed during notification. Remaining
    /// subscribers in that pass are not invoked.
    #[error("subscriber callback failed")]
    Subscriber(#[source] BoxError),
}

impl StoreError {
    /// Wrap an arbitrary error as an executor failure.
    pub fn executor(err: impl Into<BoxError>) -> Self {
        Self::Executor(err.into())
    }

    /// Wrap an arbitrary error as a subscriber failure.
    pub fn subscriber(err: impl Into<BoxError>) -> Self {
        Self::Subscriber(err.into())
    }

    /// Whether this error is a circular dependency failure.
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_error_names_the_computation() {
        let id = SubscriberId::new();
        let err = StoreError::CircularDependency(id);

        assert!(err.is_circular());
        assert!(err.to_string().contains("circular dependency"));
    }

    #[test]
    fn wrapped_errors_keep_their_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "backend down");
        let err = StoreError::executor(io);

        assert!(!err.is_circular());
        assert!(err.source().is_some());
        assert_eq!(err.source().unwrap().to_string(), "backend down");
    }
}
