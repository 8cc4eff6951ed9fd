//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.postlens.toml` files.

use crate::analysis::AggregateOptions;
use crate::cli::{Args, OutputFormat};
use crate::fetcher::FetchOptions;
use crate::models::Collection;
use crate::source::SourceConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".postlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path; stdout when unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Remote collection endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Collection to page through.
    #[serde(default)]
    pub collection: Collection,

    /// Posts requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Give up after this many non-empty pages.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Thumbnail width requested from the API.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Ask the API to include NSFW posts.
    #[serde(default = "default_true")]
    pub include_nsfw: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Bearer token sent as `Authorization`.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Additional request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: Collection::default(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            width: default_width(),
            include_nsfw: true,
            timeout_seconds: default_timeout(),
            user_agent: None,
            bearer_token: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.yodayo.com".to_string()
}

fn default_page_size() -> usize {
    500
}

fn default_max_pages() -> usize {
    1000
}

fn default_width() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Sum comment counts.
    #[serde(default = "default_true")]
    pub include_comments: bool,

    /// Sum collect counts.
    #[serde(default = "default_true")]
    pub include_collects: bool,

    /// Count posts per attribution name.
    #[serde(default = "default_true")]
    pub include_attribution: bool,

    /// Rows in the top posts and top contributors tables.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Buckets in the likes histogram.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_comments: true,
            include_collects: true,
            include_attribution: true,
            top_n: default_top_n(),
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_histogram_buckets() -> usize {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Include the top posts table.
    #[serde(default = "default_true")]
    pub include_top_posts: bool,

    /// Include posts-per-month and the likes timeline.
    #[serde(default = "default_true")]
    pub include_timeline: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_top_posts: true,
            include_timeline: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Pick the config for a run: the explicit path if given, else
    /// `default_path` if it exists, else built-in defaults.
    ///
    /// A file that exists but fails to parse is an error in both cases.
    pub fn resolve(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        Ok(Self::load_optional(default_path)?.unwrap_or_default())
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            bail!("api.base_url must start with 'http://' or 'https://'");
        }
        if self.api.page_size == 0 {
            bail!("api.page_size must be at least 1");
        }
        if self.api.max_pages == 0 {
            bail!("api.max_pages must be at least 1");
        }
        if self.api.timeout_seconds == 0 {
            bail!("api.timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref base_url) = args.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(collection) = args.collection {
            self.api.collection = collection;
        }
        if let Some(page_size) = args.page_size {
            self.api.page_size = page_size;
        }
        if let Some(max_pages) = args.max_pages {
            self.api.max_pages = max_pages;
        }
        if let Some(width) = args.width {
            self.api.width = width;
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(ref token) = args.token {
            self.api.bearer_token = Some(token.clone());
        }
        if let Some(ref agent) = args.user_agent {
            self.api.user_agent = Some(agent.clone());
        }
        // Header names are case-insensitive; fold them so CLI values replace file values
        let file_headers = std::mem::take(&mut self.api.headers);
        self.api.headers = file_headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        for (name, value) in args.parsed_headers() {
            self.api.headers.insert(name.to_ascii_lowercase(), value);
        }

        // Negative flags only ever switch things off
        if args.no_nsfw {
            self.api.include_nsfw = false;
        }
        if args.no_comments {
            self.analysis.include_comments = false;
        }
        if args.no_collects {
            self.analysis.include_collects = false;
        }
        if args.no_attribution {
            self.analysis.include_attribution = false;
        }

        if let Some(top) = args.top {
            self.analysis.top_n = top;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }
    }

    /// Transport settings derived from `[api]`.
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            base_url: self.api.base_url.clone(),
            collection: self.api.collection,
            width: self.api.width,
            include_nsfw: self.api.include_nsfw,
            timeout_seconds: self.api.timeout_seconds,
            user_agent: self.api.user_agent.clone(),
            bearer_token: self.api.bearer_token.clone(),
            headers: self
                .api
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Pagination settings derived from `[api]`.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            page_size: self.api.page_size,
            max_pages: Some(self.api.max_pages),
            cancel: None,
        }
    }

    /// Aggregation toggles derived from `[analysis]`.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            include_comments: self.analysis.include_comments,
            include_collects: self.analysis.include_collects,
            include_attribution: self.analysis.include_attribution,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
