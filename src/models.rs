//! Data models for postlens.
//!
//! This module contains the records received from the remote collection
//! endpoint and the summary structures handed to the report layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which per-user collection to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Posts authored by the user
    #[default]
    Notes,
    /// Posts the user collected from other accounts
    Collects,
}

impl Collection {
    /// Path segment used in the endpoint URL.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Collection::Notes => "notes",
            Collection::Collects => "collects",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Account a post is attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: Option<String>,
}

/// A single post as returned by the API.
///
/// Every field is optional on the wire; the schema differs between the
/// `notes` and `collects` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub collects: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl Post {
    /// Identity key used for deduplication: `uuid`, falling back to `id`.
    pub fn key(&self) -> Option<&str> {
        self.uuid
            .as_deref()
            .or(self.id.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Attribution name, if present and non-blank.
    pub fn attribution(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn likes(&self) -> u64 {
        self.likes.unwrap_or(0)
    }

    /// Parsed creation time; `None` when absent or not RFC 3339.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Title for display, falling back to the identity key.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => self.key().unwrap_or("(untitled)"),
        }
    }
}

/// One page of the collection endpoint.
///
/// `posts` stays optional so that a missing field can be told apart from
/// an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub posts: Option<Vec<Post>>,
}

/// Summary statistics computed once per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    /// Number of unique posts.
    pub total_posts: usize,
    /// Sum of likes across all posts.
    pub total_likes: u64,
    /// Sum of comments, when comment aggregation is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_comments: Option<u64>,
    /// Sum of collects, when collect aggregation is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_collects: Option<u64>,
    /// Attribution name to number of posts carrying it.
    pub name_counts: BTreeMap<String, usize>,
    /// The deduplicated posts, in first-received order.
    pub posts: Vec<Post>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.total_posts == 0
    }
}

/// Metadata about a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Target user identifier.
    pub user_id: String,
    /// Collection that was paged through.
    pub collection: Collection,
    /// Endpoint base URL.
    pub base_url: String,
    /// Time the run finished.
    pub fetched_at: DateTime<Utc>,
    /// Number of non-empty pages received.
    pub pages_fetched: usize,
    /// Records dropped as duplicates.
    pub duplicates_dropped: usize,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

/// Complete report handed to the writers.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: RunMetadata,
    pub summary: AggregateResult,
}
