//! Reactive Primitives
//!
//! This module implements the core reactive system: stores, derived stores,
//! and the dependency tracker that connects them.
//!
//! # Concepts
//!
//! ## Stores
//!
//! A Store is a container for mutable state. When a store's value is read
//! within a tracked evaluation (a `computed` body), the store automatically
//! registers that evaluation as a subscriber. When the store's value
//! changes, all subscribers are notified synchronously, in registration
//! order. Writes that compare equal to the current value notify nobody.
//!
//! ## Computed stores
//!
//! `computed` builds a store whose value is re-derived by running an
//! executor. The executor's store reads are discovered automatically on
//! each run; there is no dependency list to declare and no graph to
//! maintain. Re-entry of a running computation is detected and fails with
//! a circular dependency error.
//!
//! ## Producer stores
//!
//! `from` builds a store fed by an arbitrary producer function that
//! receives the store handle once and writes whenever it wants to. No
//! dependency tracking applies.
//!
//! # Implementation Notes
//!
//! Dependency discovery uses a thread-local stack of running evaluations.
//! When a store is read, it checks the top of the stack and, if an
//! evaluation is active, registers it. This approach (sometimes called
//! "automatic dependency tracking" or "transparent reactivity") is used by
//! Svelte stores, SolidJS, and Leptos.

mod computed;
mod producer;
mod store;
mod subscriber;
mod tracker;

pub use computed::{computed, try_computed};
pub use producer::{from, try_from};
pub use store::Store;
pub use subscriber::{SubscriberId, Subscription};
pub use tracker::Tracker;
