//! Errors raised while paging through a collection.

use thiserror::Error;

/// Reasons a fetch run can abort.
///
/// None of these are ever folded into a successful, partial result.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, read, timeout).
    #[error("request for offset {offset} failed: {source}")]
    Transport {
        offset: usize,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("GET {url} at offset {offset} failed with status {status}")]
    Status {
        url: String,
        offset: usize,
        status: u16,
    },

    /// The page body could not be interpreted.
    #[error("unexpected page shape at offset {offset}: {message}")]
    Schema { offset: usize, message: String },

    /// A post carried neither `uuid` nor `id`.
    #[error("post #{index} of page at offset {offset} has no identifier")]
    MissingIdentifier { offset: usize, index: usize },

    /// The configured page cap was reached before an empty page.
    #[error("stopped after {pages} pages without reaching the end of the collection")]
    PageLimit { pages: usize },

    /// The run was interrupted between pages.
    #[error("cancelled after fetching {fetched} posts")]
    Cancelled { fetched: usize },
}

impl FetchError {
    /// HTTP status code, for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
