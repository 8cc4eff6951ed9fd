//! HTTP transport for the collection endpoint.

use super::PageSource;
use crate::fetcher::FetchError;
use crate::models::{Collection, PageResponse, Post};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Settings for [`HttpPageSource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub collection: Collection,
    pub width: u32,
    pub include_nsfw: bool,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
    pub bearer_token: Option<String>,
    /// Extra request headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.yodayo.com".to_string(),
            collection: Collection::Notes,
            width: 100,
            include_nsfw: true,
            timeout_seconds: 30,
            user_agent: None,
            bearer_token: None,
            headers: Vec::new(),
        }
    }
}

/// Fetches pages from `{base_url}/v1/users/{user}/{collection}`.
pub struct HttpPageSource {
    client: reqwest::Client,
    config: SourceConfig,
}

impl HttpPageSource {
    /// Build a client with the configured default headers.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let headers = build_headers(&config)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Endpoint URL for a user, without query parameters.
    pub fn endpoint(&self, target: &str) -> String {
        format!(
            "{}/v1/users/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            target,
            self.config.collection.path_segment()
        )
    }
}

fn build_headers(config: &SourceConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(ref agent) = config.user_agent {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(agent).context("Invalid user agent")?,
        );
    }

    if let Some(ref token) = config.bearer_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Invalid bearer token")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name: {}", name))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(
        &self,
        target: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, FetchError> {
        let url = self.endpoint(target);
        debug!("GET {} offset={} limit={}", url, offset, limit);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("width", self.config.width.to_string()),
                ("include_nsfw", self.config.include_nsfw.to_string()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport { offset, source })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url,
                offset,
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { offset, source })?;

        let page: PageResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Schema {
                offset,
                message: e.to_string(),
            })?;

        page.posts.ok_or_else(|| FetchError::Schema {
            offset,
            message: "response has no `posts` field".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchOptions, Paginator};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer, config: SourceConfig) -> HttpPageSource {
        HttpPageSource::new(SourceConfig {
            base_url: server.uri(),
            ..config
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_url() {
        let source = HttpPageSource::new(SourceConfig {
            base_url: "https://api.example.com/".to_string(),
            collection: Collection::Collects,
            ..SourceConfig::default()
        })
        .unwrap();

        assert_eq!(
            source.endpoint("abc"),
            "https://api.example.com/v1/users/abc/collects"
        );
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = HttpPageSource::new(SourceConfig {
            headers: vec![("bad header".to_string(), "x".to_string())],
            ..SourceConfig::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/u1/notes"))
            .and(query_param("offset", "500"))
            .and(query_param("limit", "500"))
            .and(query_param("width", "100"))
            .and(query_param("include_nsfw", "false"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-csrf-token", "abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(include_str!("../../fixtures/page_two.json"), "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(
            &server,
            SourceConfig {
                include_nsfw: false,
                bearer_token: Some("secret".to_string()),
                headers: vec![("X-CSRF-Token".to_string(), "abc".to_string())],
                ..SourceConfig::default()
            },
        );

        let posts = source.fetch_page("u1", 500, 500).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].key(), Some("c"));
    }

    #[tokio::test]
    async fn test_fetch_page_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = source_for(&server, SourceConfig::default());
        let err = source.fetch_page("u1", 1000, 500).await.unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(matches!(err, FetchError::Status { offset: 1000, .. }));
        let message = err.to_string();
        assert!(message.contains("/v1/users/u1/notes"));
        assert!(message.contains("offset 1000"));
    }

    #[tokio::test]
    async fn test_fetch_page_missing_posts_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"error": "nope"}"#, "application/json"))
            .mount(&server)
            .await;

        let source = source_for(&server, SourceConfig::default());
        let err = source.fetch_page("u1", 0, 500).await.unwrap_err();

        assert!(matches!(err, FetchError::Schema { offset: 0, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_invalid_json_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>challenge</html>"))
            .mount(&server)
            .await;

        let source = source_for(&server, SourceConfig::default());
        let err = source.fetch_page("u1", 0, 500).await.unwrap_err();

        assert!(matches!(err, FetchError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                include_str!("../../fixtures/page_empty.json"),
                "application/json",
            ))
            .mount(&server)
            .await;

        let source = source_for(&server, SourceConfig::default());
        let posts = source.fetch_page("u1", 0, 500).await.unwrap();

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let source = HttpPageSource::new(SourceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 5,
            ..SourceConfig::default()
        })
        .unwrap();

        let err = source.fetch_page("u1", 0, 500).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport { offset: 0, .. }));
    }

    #[tokio::test]
    async fn test_paginate_over_http() {
        let server = MockServer::start().await;
        for (offset, body) in [
            ("0", include_str!("../../fixtures/page_one.json")),
            ("2", include_str!("../../fixtures/page_two.json")),
            ("4", include_str!("../../fixtures/page_empty.json")),
        ] {
            Mock::given(method("GET"))
                .and(path("/v1/users/u1/collects"))
                .and(query_param("offset", offset))
                .and(query_param("limit", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
                .expect(1)
                .mount(&server)
                .await;
        }

        let source = source_for(
            &server,
            SourceConfig {
                collection: Collection::Collects,
                ..SourceConfig::default()
            },
        );
        let options = FetchOptions {
            page_size: 2,
            ..FetchOptions::default()
        };

        let outcome = Paginator::new(&source, options)
            .fetch_all("u1", &())
            .await
            .unwrap();

        let keys: Vec<_> = outcome.posts.iter().filter_map(Post::key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.duplicates_dropped, 1);
    }
}
