//! Upstream HTTP client
//!
//! Every request to the video site goes through [`UpstreamClient::fetch`],
//! which tries a chain of routes:
//!
//! 1. the URL itself, retried `max_retries` times,
//! 2. the same path on each configured mirror,
//! 3. each configured prefix proxy with the URL percent-encoded.
//!
//! When every route fails the error of the direct attempt is returned.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, PRAGMA};
use std::time::Instant;

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;

type FetchResult = std::result::Result<String, UpstreamError>;

/// HTTP client for the video site
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

fn header_value(name: &str, value: &str) -> std::result::Result<HeaderValue, UpstreamError> {
    HeaderValue::from_str(value)
        .map_err(|e| UpstreamError::ClientBuild(format!("invalid {} header: {}", name, e)))
}

impl UpstreamClient {
    /// Create a client sending browser-like headers on every request.
    pub fn new(config: &UpstreamConfig) -> std::result::Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value("Accept", &config.accept)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &config.accept_language)?,
        );
        headers.insert(COOKIE, header_value("Cookie", &config.cookie)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpstreamError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Base URL of the video site, without trailing slash
    pub fn base(&self) -> &str {
        self.config.base()
    }

    /// Absolute URL for a path on the video site.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base(), path)
        } else {
            format!("{}/{}", self.base(), path)
        }
    }

    /// One GET request. Non-2xx responses are errors.
    async fn attempt(&self, url: &str) -> FetchResult {
        let started = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        tracing::debug!("Response status {} for {} in {:?}", status, url, started.elapsed());
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| UpstreamError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET with up to `max_retries` retries after the first attempt.
    pub async fn fetch_with_retry(&self, url: &str) -> FetchResult {
        let mut retries_left = self.config.max_retries;
        loop {
            tracing::debug!("Fetching URL: {}", url);
            match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(e) if retries_left > 0 => {
                    tracing::warn!("Request failed ({} retries left): {}", retries_left, e);
                    retries_left -= 1;
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fallback routes for `url`, in the order they are tried.
    pub fn fallback_urls(&self, url: &str) -> Vec<String> {
        let mut urls = Vec::new();
        if let Some(path) = url.strip_prefix(self.base()) {
            for mirror in &self.config.mirrors {
                urls.push(format!("{}{}", mirror.trim_end_matches('/'), path));
            }
        }
        for prefix in &self.config.proxy_prefixes {
            urls.push(format!("{}{}", prefix, urlencoding::encode(url)));
        }
        urls
    }

    /// GET through the full fallback chain.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let direct_err = match self.fetch_with_retry(url).await {
            Ok(body) => return Ok(body),
            Err(e) => e,
        };

        let fallbacks = self.fallback_urls(url);
        if !fallbacks.is_empty() {
            tracing::warn!("Direct request failed, trying {} fallback route(s): {}", fallbacks.len(), direct_err);
        }
        for fallback in fallbacks {
            match self.fetch_with_retry(&fallback).await {
                Ok(body) => {
                    tracing::info!("Fetched {} via {}", url, fallback);
                    return Ok(body);
                }
                Err(e) => tracing::warn!("Fallback {} failed: {}", fallback, e),
            }
        }

        Err(direct_err)
    }
}
