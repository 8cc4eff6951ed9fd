//! Paginated retrieval of a user's posts.
//!
//! This module pages through a [`PageSource`](crate::source::PageSource)
//! until it returns an empty page and collapses duplicate records.

pub mod dedup;
pub mod error;
pub mod paginator;

pub use dedup::Deduplicator;
pub use error::FetchError;
pub use paginator::{FetchObserver, FetchOptions, FetchProgress, Paginator};

use crate::models::Post;

/// Everything a completed fetch run produced.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Unique posts in first-received order.
    pub posts: Vec<Post>,
    /// Number of non-empty pages received.
    pub pages_fetched: usize,
    /// Records dropped because their key was already seen.
    pub duplicates_dropped: usize,
}
