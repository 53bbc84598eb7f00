//! Domain logic that owns order invariants independently of storage.

pub mod order_lifecycle;

pub use order_lifecycle::{OrderLifecycle, Transition};
