//! Offset/limit pagination loop.
//!
//! Requests pages of a fixed size at increasing offsets until the source
//! returns an empty page. Any failure aborts the whole run.

use super::{Deduplicator, FetchError, FetchOutcome};
use crate::source::PageSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Pagination settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Number of posts requested per page.
    pub page_size: usize,
    /// Maximum number of non-empty pages before giving up.
    pub max_pages: Option<usize>,
    /// Set to true to stop before the next page request.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_pages: Some(1000),
            cancel: None,
        }
    }
}

/// Progress after one page has been merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    /// 1-based page number.
    pub page: usize,
    /// Offset the page was requested at.
    pub offset: usize,
    /// Records on this page.
    pub received: usize,
    /// Unique posts collected so far.
    pub unique: usize,
}

/// Receives progress updates. Purely advisory.
pub trait FetchObserver {
    fn on_page(&self, _progress: &FetchProgress) {}
}

impl FetchObserver for () {}

/// Drives a [`PageSource`] to exhaustion.
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    options: FetchOptions,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    pub fn new(source: &'a S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Fetch every page for `target` and return the unique posts.
    pub async fn fetch_all(
        &self,
        target: &str,
        observer: &dyn FetchObserver,
    ) -> Result<FetchOutcome, FetchError> {
        let page_size = self.options.page_size;
        let mut dedup = Deduplicator::new();
        let mut offset = 0;
        let mut pages = 0;

        info!("Fetching posts for {} (page size {})", target, page_size);

        loop {
            if self.is_cancelled() {
                return Err(FetchError::Cancelled {
                    fetched: dedup.len(),
                });
            }

            let page = self.source.fetch_page(target, offset, page_size).await?;
            if page.is_empty() {
                debug!("Empty page at offset {}, done", offset);
                break;
            }

            if let Some(max) = self.options.max_pages {
                if pages >= max {
                    return Err(FetchError::PageLimit { pages });
                }
            }

            let received = page.len();
            for (index, post) in page.into_iter().enumerate() {
                let key = post
                    .key()
                    .ok_or(FetchError::MissingIdentifier { offset, index })?
                    .to_string();
                if !dedup.insert(&key, post) {
                    debug!("Dropping duplicate post {}", key);
                }
            }

            pages += 1;
            debug!(
                "Page {} at offset {}: {} records, {} unique so far",
                pages,
                offset,
                received,
                dedup.len()
            );
            observer.on_page(&FetchProgress {
                page: pages,
                offset,
                received,
                unique: dedup.len(),
            });

            offset += received;
        }

        let (posts, duplicates_dropped) = dedup.finish();
        info!(
            "Fetched {} unique posts in {} pages ({} duplicates dropped)",
            posts.len(),
            pages,
            duplicates_dropped
        );

        Ok(FetchOutcome {
            posts,
            pages_fetched: pages,
            duplicates_dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Post;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    enum Step {
        Page(Vec<Post>),
        Fail(u16),
    }

    /// Replays a fixed sequence of pages and records each request.
    struct ScriptedSource {
        steps: Mutex<Vec<Step>>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ScriptedSource {
        fn new(mut steps: Vec<Step>) -> Self {
            steps.reverse();
            Self {
                steps: Mutex::new(steps),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn pages(pages: Vec<Vec<Post>>) -> Self {
            Self::new(pages.into_iter().map(Step::Page).collect())
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _target: &str,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<Post>, FetchError> {
            self.calls.lock().unwrap().push((offset, limit));
            match self.steps.lock().unwrap().pop() {
                Some(Step::Page(posts)) => Ok(posts),
                Some(Step::Fail(status)) => Err(FetchError::Status {
                    url: "mock".to_string(),
                    offset,
                    status,
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    struct Recorder(Mutex<Vec<FetchProgress>>);

    impl FetchObserver for Recorder {
        fn on_page(&self, progress: &FetchProgress) {
            self.0.lock().unwrap().push(*progress);
        }
    }

    fn post(key: &str) -> Post {
        Post {
            uuid: Some(key.to_string()),
            likes: Some(1),
            ..Default::default()
        }
    }

    fn options(page_size: usize) -> FetchOptions {
        FetchOptions {
            page_size,
            ..FetchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_offsets_advance_by_received_count() {
        let source = ScriptedSource::pages(vec![
            vec![post("a"), post("b"), post("c")],
            vec![post("d"), post("e")],
            vec![],
        ]);

        let outcome = Paginator::new(&source, options(3))
            .fetch_all("u1", &())
            .await
            .unwrap();

        assert_eq!(outcome.posts.len(), 5);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(source.calls(), vec![(0, 3), (3, 3), (5, 3)]);
    }

    #[tokio::test]
    async fn test_output_is_deduplicated_union() {
        let source = ScriptedSource::pages(vec![
            vec![post("a"), post("b")],
            vec![post("b"), post("c")],
            vec![post("a"), post("d")],
            vec![],
        ]);

        let outcome = Paginator::new(&source, options(2))
            .fetch_all("u1", &())
            .await
            .unwrap();

        let keys: Vec<_> = outcome.posts.iter().filter_map(Post::key).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(outcome.duplicates_dropped, 2);

        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[tokio::test]
    async fn test_empty_first_page_is_success() {
        let source = ScriptedSource::pages(vec![vec![]]);

        let outcome = Paginator::new(&source, FetchOptions::default())
            .fetch_all("u1", &())
            .await
            .unwrap();

        assert!(outcome.posts.is_empty());
        assert_eq!(outcome.pages_fetched, 0);
        assert_eq!(source.calls(), vec![(0, 500)]);
    }

    #[tokio::test]
    async fn test_failure_mid_stream_is_error() {
        let source = ScriptedSource::new(vec![
            Step::Page(vec![post("a"), post("b")]),
            Step::Fail(503),
            Step::Page(vec![]),
        ]);

        let err = Paginator::new(&source, options(2))
            .fetch_all("u1", &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(matches!(err, FetchError::Status { offset: 2, .. }));
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_page_limit_is_error() {
        let source = ScriptedSource::pages(vec![
            vec![post("a")],
            vec![post("b")],
            vec![post("c")],
        ]);

        let err = Paginator::new(
            &source,
            FetchOptions {
                page_size: 1,
                max_pages: Some(2),
                cancel: None,
            },
        )
        .fetch_all("u1", &())
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::PageLimit { pages: 2 }));
    }

    #[tokio::test]
    async fn test_page_limit_not_hit_when_exact() {
        let source = ScriptedSource::pages(vec![vec![post("a")], vec![post("b")], vec![]]);

        let outcome = Paginator::new(
            &source,
            FetchOptions {
                page_size: 1,
                max_pages: Some(2),
                cancel: None,
            },
        )
        .fetch_all("u1", &())
        .await
        .unwrap();

        assert_eq!(outcome.posts.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_is_error() {
        let flag = Arc::new(AtomicBool::new(true));
        let source = ScriptedSource::pages(vec![vec![post("a")], vec![]]);

        let err = Paginator::new(
            &source,
            FetchOptions {
                cancel: Some(Arc::clone(&flag)),
                ..FetchOptions::default()
            },
        )
        .fetch_all("u1", &())
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled { fetched: 0 }));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_identifier_is_error() {
        let source = ScriptedSource::pages(vec![vec![post("a"), Post::default()], vec![]]);

        let err = Paginator::new(&source, options(2))
            .fetch_all("u1", &())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::MissingIdentifier {
                offset: 0,
                index: 1
            }
        ));
    }

    #[test]
    fn test_observer_sees_every_page() {
        let source = ScriptedSource::pages(vec![vec![post("a"), post("b")], vec![post("b")], vec![]]);
        let recorder = Recorder(Mutex::new(Vec::new()));

        tokio_test::block_on(Paginator::new(&source, options(2)).fetch_all("u1", &recorder))
            .unwrap();

        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                FetchProgress {
                    page: 1,
                    offset: 0,
                    received: 2,
                    unique: 2
                },
                FetchProgress {
                    page: 2,
                    offset: 2,
                    received: 1,
                    unique: 2
                },
            ]
        );
    }
}
