//! Ripple Core
//!
//! This crate provides the core primitives for the Ripple reactive state
//! library. It implements:
//!
//! - Reactive stores with equality-gated writes and ordered notification
//! - Automatic dependency tracking with circular-dependency detection
//! - Derived stores (`computed`) and producer-driven stores (`from`)
//!
//! There is no scheduler, no batching, and no dependency graph structure:
//! propagation is synchronous subscriber notification, and dependencies are
//! whatever a computation actually read on its most recent run.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: stores, derivation helpers, and the dependency tracker
//! - `error`: the `StoreError` taxonomy shared by all fallible operations
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{computed, Store};
//!
//! // Create a store
//! let count = Store::new(1);
//!
//! // Create a derived store
//! let doubled = computed({
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! // Observe it
//! let _sub = doubled.subscribe(|new, _old| {
//!     println!("doubled is now {new}");
//! });
//!
//! // Update the input; the derivation re-runs and the subscriber fires
//! count.set(5)?;
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod error;
pub mod reactive;

pub use error::{BoxError, StoreError};
pub use reactive::{computed, from, try_computed, try_from, Store, SubscriberId, Subscription, Tracker};
