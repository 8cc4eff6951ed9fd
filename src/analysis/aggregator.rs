//! Post aggregation and statistics.
//!
//! This module turns the deduplicated post list into summary statistics
//! and the derived views the report layer renders.

use crate::models::{AggregateResult, Post};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Which optional statistics to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub include_comments: bool,
    pub include_collects: bool,
    pub include_attribution: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            include_collects: true,
            include_attribution: true,
        }
    }
}

/// Compute the summary for a list of posts.
///
/// Absent counters are treated as zero and posts without an attribution
/// name are left out of `name_counts` only. Totals saturate at `u64::MAX`.
pub fn aggregate(posts: Vec<Post>, options: AggregateOptions) -> AggregateResult {
    let total_likes = saturating_total(posts.iter().map(Post::likes));

    let total_comments = options
        .include_comments
        .then(|| saturating_total(posts.iter().map(|p| p.comments.unwrap_or(0))));

    let total_collects = options
        .include_collects
        .then(|| saturating_total(posts.iter().map(|p| p.collects.unwrap_or(0))));

    let name_counts = if options.include_attribution {
        count_names(&posts)
    } else {
        BTreeMap::new()
    };

    AggregateResult {
        total_posts: posts.len(),
        total_likes,
        total_comments,
        total_collects,
        name_counts,
        posts,
    }
}

fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Count posts per attribution name.
pub fn count_names(posts: &[Post]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for name in posts.iter().filter_map(Post::attribution) {
        *counts.entry(name.to_string()).or_default() += 1;
    }

    counts
}

/// Get the top N posts by likes. Ties keep input order.
pub fn top_posts_by_likes(posts: &[Post], n: usize) -> Vec<&Post> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by_key(|p| std::cmp::Reverse(p.likes()));
    sorted.truncate(n);
    sorted
}

/// Count posts per content rating, with missing ratings as "unknown".
pub fn content_rating_distribution(posts: &[Post]) -> BTreeMap<String, usize> {
    let mut dist: BTreeMap<String, usize> = BTreeMap::new();

    for post in posts {
        let rating = post
            .content_rating
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("unknown");
        *dist.entry(rating.to_string()).or_default() += 1;
    }

    dist
}

/// One bucket of the likes histogram, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikesBucket {
    pub low: u64,
    pub high: u64,
    pub count: usize,
}

/// Split `[0, max_likes]` into equal-width buckets and count posts in each.
pub fn likes_histogram(posts: &[Post], buckets: usize) -> Vec<LikesBucket> {
    if posts.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let max = posts.iter().map(Post::likes).max().unwrap_or(0);
    let width = (max / buckets as u64).saturating_add(1);

    let mut histogram: Vec<LikesBucket> = (0..buckets as u64)
        .map(|i| LikesBucket {
            low: i.saturating_mul(width),
            high: (i + 1).saturating_mul(width).saturating_sub(1),
            count: 0,
        })
        .take_while(|b| b.low <= max)
        .collect();

    // Near u64::MAX the bounds saturate; the last bucket always reaches max
    let last = histogram.len() - 1;
    histogram[last].high = histogram[last].high.max(max);

    for post in posts {
        let index = ((post.likes() / width) as usize).min(last);
        histogram[index].count += 1;
    }

    histogram
}

/// Likes over time, sorted by creation date.
///
/// Posts whose `created_at` is missing or unparseable are skipped.
pub fn timeline(posts: &[Post]) -> Vec<(DateTime<Utc>, u64)> {
    let mut points: Vec<_> = posts
        .iter()
        .filter_map(|p| p.created_at_utc().map(|at| (at, p.likes())))
        .collect();
    points.sort_by_key(|(at, _)| *at);
    points
}

/// Number of posts per `YYYY-MM`.
pub fn posts_per_month(posts: &[Post]) -> BTreeMap<String, usize> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();

    for (at, _) in timeline(posts) {
        *months.entry(at.format("%Y-%m").to_string()).or_default() += 1;
    }

    months
}

/// Most frequent attribution names, highest count first, then by name.
pub fn top_contributors(result: &AggregateResult, n: usize) -> Vec<(&str, usize)> {
    let mut names: Vec<_> = result
        .name_counts
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();

    // BTreeMap iteration is already name-ordered; the stable sort keeps it.
    names.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    names.truncate(n);
    names
}
