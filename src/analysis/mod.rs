//! Analysis modules.
//!
//! Aggregation over the fetched post list.

pub mod aggregator;

pub use aggregator::*;
