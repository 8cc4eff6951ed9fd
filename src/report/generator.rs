//! Markdown and JSON report generation.
//!
//! This module renders the aggregation result as tables. No charts are
//! drawn; the histogram and timeline are emitted as plain counts.

use crate::analysis::{
    content_rating_distribution, likes_histogram, posts_per_month, top_contributors,
    top_posts_by_likes,
};
use crate::models::{AggregateResult, Report, RunMetadata};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// What to include in a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub top_n: usize,
    pub histogram_buckets: usize,
    pub include_top_posts: bool,
    pub include_timeline: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            histogram_buckets: 10,
            include_top_posts: true,
            include_timeline: true,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Post Report: {}\n\n", report.metadata.user_id));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_statistics_section(&report.summary));

    if options.include_top_posts {
        output.push_str(&generate_top_posts_section(&report.summary, options.top_n));
    }

    output.push_str(&generate_rating_section(&report.summary));
    output.push_str(&generate_histogram_section(
        &report.summary,
        options.histogram_buckets,
    ));
    output.push_str(&generate_contributors_section(&report.summary, options.top_n));

    if options.include_timeline {
        output.push_str(&generate_timeline_section(&report.summary));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **User:** `{}`\n", metadata.user_id));
    section.push_str(&format!("- **Collection:** {}\n", metadata.collection));
    section.push_str(&format!("- **API:** {}\n", metadata.base_url));
    section.push_str(&format!(
        "- **Fetched At:** {}\n",
        metadata.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Pages:** {}\n", metadata.pages_fetched));
    if metadata.duplicates_dropped > 0 {
        section.push_str(&format!(
            "- **Duplicates Dropped:** {}\n",
            metadata.duplicates_dropped
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the basic statistics table.
fn generate_statistics_section(summary: &AggregateResult) -> String {
    let mut section = String::new();

    section.push_str("## Basic Statistics\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Total Posts | {} |\n", summary.total_posts));
    section.push_str(&format!("| Total Likes | {} |\n", summary.total_likes));
    if let Some(comments) = summary.total_comments {
        section.push_str(&format!("| Total Comments | {} |\n", comments));
    }
    if let Some(collects) = summary.total_collects {
        section.push_str(&format!("| Total Collects | {} |\n", collects));
    }
    section.push('\n');

    section
}

/// Generate the most-liked posts table.
fn generate_top_posts_section(summary: &AggregateResult, n: usize) -> String {
    let top = top_posts_by_likes(&summary.posts, n);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("## Top {} Most Liked Posts\n\n", top.len()));
    section.push_str("| # | Title | Likes | Comments | Collects |\n");
    section.push_str("|---:|:---|---:|---:|---:|\n");

    for (i, post) in top.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            escape_cell(post.display_title()),
            post.likes(),
            format_optional(post.comments),
            format_optional(post.collects),
        ));
    }
    section.push('\n');

    section
}

/// Generate the content rating distribution table.
fn generate_rating_section(summary: &AggregateResult) -> String {
    let dist = content_rating_distribution(&summary.posts);
    if dist.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Content Rating Distribution\n\n");
    section.push_str("| Rating | Posts |\n");
    section.push_str("|:---|---:|\n");

    let mut ratings: Vec<_> = dist.iter().collect();
    ratings.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    for (rating, count) in ratings {
        section.push_str(&format!("| {} | {} |\n", escape_cell(rating), count));
    }
    section.push('\n');

    section
}

/// Generate the likes distribution table.
fn generate_histogram_section(summary: &AggregateResult, buckets: usize) -> String {
    let histogram = likes_histogram(&summary.posts, buckets);
    if histogram.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Distribution of Likes\n\n");
    section.push_str("| Likes | Posts |\n");
    section.push_str("|:---|---:|\n");

    for bucket in histogram {
        section.push_str(&format!(
            "| {}-{} | {} |\n",
            bucket.low, bucket.high, bucket.count
        ));
    }
    section.push('\n');

    section
}

/// Generate the top contributors table.
fn generate_contributors_section(summary: &AggregateResult, n: usize) -> String {
    let top = top_contributors(summary, n);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Top Contributors\n\n");
    section.push_str("| Name | Posts |\n");
    section.push_str("|:---|---:|\n");

    for (name, count) in top {
        section.push_str(&format!("| {} | {} |\n", escape_cell(name), count));
    }
    section.push('\n');

    section
}

/// Generate the posts-per-month table.
fn generate_timeline_section(summary: &AggregateResult) -> String {
    let months = posts_per_month(&summary.posts);
    if months.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Posts Timeline\n\n");
    section.push_str("| Month | Posts |\n");
    section.push_str("|:---|---:|\n");

    for (month, count) in &months {
        section.push_str(&format!("| {} | {} |\n", month, count));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by postlens v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn format_optional(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// JSON layout: the raw report plus the derived distributions.
#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a RunMetadata,
    summary: &'a AggregateResult,
    content_ratings: BTreeMap<String, usize>,
    posts_per_month: BTreeMap<String, usize>,
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    let json = JsonReport {
        metadata: &report.metadata,
        summary: &report.summary,
        content_ratings: content_rating_distribution(&report.summary.posts),
        posts_per_month: posts_per_month(&report.summary.posts),
    };
    serde_json::to_string_pretty(&json).map_err(Into::into)
}
