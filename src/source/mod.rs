//! Page transports.
//!
//! The fetcher only needs "give me the page at this offset"; how the
//! request is authenticated and shaped lives behind [`PageSource`].

pub mod http;

pub use http::{HttpPageSource, SourceConfig};

use crate::fetcher::FetchError;
use crate::models::Post;
use async_trait::async_trait;

/// A paginated collection endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch up to `limit` posts for `target`, starting at `offset`.
    ///
    /// An empty vector means the collection is exhausted. Failures must
    /// be returned as errors, never as an empty page.
    async fn fetch_page(
        &self,
        target: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, FetchError>;
}
