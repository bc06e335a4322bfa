//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - Upstream HTTP client
//! - Upstream response cache

use bytes::Bytes;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::http::cache::ResponseCache;
use crate::upstream::UpstreamClient;
use crate::video_id::VideoId;
use crate::youtube::{fetch_caption_xml, fetch_video_info, SubtitleKind, VideoInfo};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub client: UpstreamClient,
    pub cache: ResponseCache,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        let cache = ResponseCache::new(config.cache.clone());
        Ok(Self {
            config,
            client,
            cache,
            started_at: Instant::now(),
        })
    }

    /// Language used when a request doesn't name one
    pub fn default_language(&self) -> &str {
        &self.config.subtitles.default_language
    }

    /// Video info, served from cache when possible.
    pub async fn video_info(&self, id: &VideoId) -> VideoInfo {
        if let Some(data) = self.cache.get("info", id.as_str(), "") {
            if let Ok(info) = serde_json::from_slice::<VideoInfo>(&data) {
                return info;
            }
        }

        let info = fetch_video_info(&self.client, id).await;
        // Placeholder titles are not worth keeping around.
        if info.title != crate::youtube::info::default_title(id) {
            if let Ok(json) = serde_json::to_vec(&info) {
                self.cache.insert("info", id.as_str(), "", Bytes::from(json));
            }
        }
        info
    }

    /// Caption XML, served from cache when possible.
    pub async fn caption_xml(
        &self,
        id: &VideoId,
        kind: SubtitleKind,
        language: &str,
    ) -> Result<String> {
        let variant = format!("{}:{}", kind, language);
        if let Some(data) = self.cache.get("captions", id.as_str(), &variant) {
            tracing::debug!("Caption cache hit for {} ({})", id, variant);
            return Ok(String::from_utf8_lossy(&data).into_owned());
        }

        let xml = fetch_caption_xml(&self.client, id, kind, language).await?;
        self.cache
            .insert("captions", id.as_str(), &variant, Bytes::from(xml.clone()));
        Ok(xml)
    }
}
