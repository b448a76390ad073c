//! Analysis modules.
//!
//! Derived statistics over a candidate pool.

pub mod aggregator;

pub use aggregator::*;
