//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Collection;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Postlens - summarize a user's posts from a paginated social API
///
/// Pages through every post of a user, drops duplicates and prints
/// like/comment/collect totals, top posts and contributor counts.
///
/// Examples:
///   postlens 3f1c9a2e-user-id
///   postlens 3f1c9a2e-user-id --collection collects --top 20
///   postlens 3f1c9a2e-user-id --format json --output stats.json
///   postlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Identifier of the user whose posts are analyzed
    #[arg(value_name = "USER_ID", required_unless_present = "init_config")]
    pub user_id: Option<String>,

    /// Collection to page through
    #[arg(long, value_name = "KIND")]
    pub collection: Option<Collection>,

    /// API base URL
    #[arg(long, value_name = "URL", env = "POSTLENS_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, value_name = "TOKEN", env = "POSTLENS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(long = "header", short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Posts requested per page
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Abort if the collection has not ended after this many pages
    #[arg(long, value_name = "COUNT")]
    pub max_pages: Option<usize>,

    /// Thumbnail width requested from the API
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Exclude NSFW posts from the results
    #[arg(long)]
    pub no_nsfw: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip summing comment counts
    #[arg(long)]
    pub no_comments: bool,

    /// Skip summing collect counts
    #[arg(long)]
    pub no_collects: bool,

    /// Skip counting posts per attribution name
    #[arg(long)]
    pub no_attribution: bool,

    /// Rows in the top posts and top contributors tables
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .postlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .postlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The target user id; empty if not set (validated first).
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.user_id().trim().is_empty() {
            return Err("User ID must not be empty".to_string());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.max_pages == Some(0) {
            return Err("Max pages must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for header in &self.headers {
            if split_header(header).is_none() {
                return Err(format!(
                    "Header must look like 'Name: value', got '{}'",
                    header
                ));
            }
        }

        Ok(())
    }

    /// Extra headers as (name, value) pairs; malformed entries are skipped.
    pub fn parsed_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|h| split_header(h))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn split_header(header: &str) -> Option<(&str, &str)> {
    let (name, value) = header.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
