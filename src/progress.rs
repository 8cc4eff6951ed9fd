//! Terminal progress reporting for the fetch loop.

use crate::fetcher::{FetchObserver, FetchProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that shows how many posts have been fetched so far.
pub struct SpinnerObserver {
    bar: Option<ProgressBar>,
}

impl SpinnerObserver {
    /// Create a spinner; a hidden one when `show` is false.
    pub fn new(show: bool) -> Self {
        let bar = show.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Fetching posts...");
            pb
        });

        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        if let Some(ref pb) = self.bar {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn abandon(&self) {
        if let Some(ref pb) = self.bar {
            pb.abandon();
        }
    }
}

impl FetchObserver for SpinnerObserver {
    fn on_page(&self, progress: &FetchProgress) {
        if let Some(ref pb) = self.bar {
            pb.set_message(format!(
                "Fetched {} posts ({} pages)",
                progress.unique, progress.page
            ));
        }
    }
}
