//! Postlens - summarize a user's posts from a paginated social API.
//!
//! Pages through a user's posts, collapses duplicates and reports
//! like/comment/collect totals and per-contributor counts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch failure, bad config, I/O, etc.)
//!   2 - The user has no posts

mod analysis;
mod cli;
mod config;
mod fetcher;
mod models;
mod progress;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use fetcher::Paginator;
use models::{Report, RunMetadata};
use progress::SpinnerObserver;
use report::ReportOptions;
use source::HttpPageSource;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config decides the log level, so it is loaded before logging starts
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("Postlens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!(
        "Config: base_url={} collection={} page_size={} max_pages={}",
        config.api.base_url, config.api.collection, config.api.page_size, config.api.max_pages
    );

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .postlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Fetch, aggregate and report. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let user_id = args.user_id().trim().to_string();

    // Step 1: Page through the collection
    let source = HttpPageSource::new(config.source_config())?;
    info!("Endpoint: {}", source.endpoint(&user_id));

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_interrupt_handler(Arc::clone(&cancel));

    let mut fetch_options = config.fetch_options();
    fetch_options.cancel = Some(cancel);

    let observer = SpinnerObserver::new(!args.quiet);
    let outcome = match Paginator::new(&source, fetch_options)
        .fetch_all(&user_id, &observer)
        .await
    {
        Ok(outcome) => {
            observer.finish(&format!("Fetched {} posts", outcome.posts.len()));
            outcome
        }
        Err(e) => {
            observer.abandon();
            if matches!(e.status(), Some(401 | 403)) {
                warn!("The API refused the request; check the token and extra headers");
            }
            return Err(e).context(format!("Failed to fetch posts for user {}", user_id));
        }
    };

    // Step 2: Aggregate
    let summary = analysis::aggregate(outcome.posts, config.aggregate_options());

    if summary.is_empty() {
        warn!("No posts returned for user {}", user_id);
        eprintln!("\n⚠️  No posts found for user {}.", user_id);
        return Ok(2);
    }

    let metadata = RunMetadata {
        user_id: user_id.clone(),
        collection: config.api.collection,
        base_url: config.api.base_url.clone(),
        fetched_at: Utc::now(),
        pages_fetched: outcome.pages_fetched,
        duplicates_dropped: outcome.duplicates_dropped,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report { metadata, summary };

    // Step 3: Render
    let report_options = ReportOptions {
        top_n: config.analysis.top_n,
        histogram_buckets: config.analysis.histogram_buckets,
        include_top_posts: config.report.include_top_posts,
        include_timeline: config.report.include_timeline,
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &report_options),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            print_summary(&report, config.analysis.top_n);
            println!("\n✅ Report saved to: {}", path.display());
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(0)
}

/// Print the headline numbers to the terminal.
fn print_summary(report: &Report, top_n: usize) {
    let summary = &report.summary;

    println!("\n📊 Summary for {}:", report.metadata.user_id);
    println!("   Total posts: {}", summary.total_posts);
    println!("   Total likes: {}", summary.total_likes);
    if let Some(comments) = summary.total_comments {
        println!("   Total comments: {}", comments);
    }
    if let Some(collects) = summary.total_collects {
        println!("   Total collects: {}", collects);
    }

    let contributors = analysis::top_contributors(summary, top_n);
    if !contributors.is_empty() {
        println!("   Top contributors:");
        for (name, count) in contributors {
            println!("     - {}: {}", name, count);
        }
    }
}

/// Set the cancel flag on Ctrl-C; the fetch loop checks it between pages.
fn spawn_interrupt_handler(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

/// Load the config file (explicit path, else the default one if present),
/// apply CLI overrides and validate the result.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::resolve(args.config.as_deref(), Path::new(DEFAULT_CONFIG_FILE))?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
