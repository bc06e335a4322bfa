//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default desktop browser user agent sent upstream
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Consent and visitor cookies that skip the interstitial consent page
pub const DEFAULT_COOKIE: &str =
    "CONSENT=YES+cb; GPS=1; VISITOR_INFO1_LIVE=true; YSC=true; PREF=tz=Asia.Tokyo";

/// Upstream (video site) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the video site
    pub base_url: String,

    /// User-Agent header
    pub user_agent: String,

    /// Cookie header
    pub cookie: String,

    /// Accept header
    pub accept: String,

    /// Accept-Language header
    pub accept_language: String,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Alternative base URLs that mirror the video site's paths
    pub mirrors: Vec<String>,

    /// Prefix proxies; the percent-encoded target URL is appended
    pub proxy_prefixes: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: DEFAULT_COOKIE.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_secs: 15,
            mirrors: Vec::new(),
            proxy_prefixes: Vec::new(),
        }
    }
}

impl UpstreamConfig {
    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the upstream response cache
    pub enabled: bool,

    /// Maximum number of cached responses
    pub max_entries: usize,

    /// Time-to-live for cached responses in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 256,
            ttl_secs: 600, // 10 minutes
        }
    }
}

/// Caption selection defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Preferred caption language code
    pub default_language: String,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Upstream configuration
    pub upstream: UpstreamConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Subtitle configuration
    pub subtitles: SubtitleConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            subtitles: SubtitleConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let base = &self.upstream.base_url;
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(format!("upstream base_url must be an http(s) URL: {}", base));
        }
        for mirror in &self.upstream.mirrors {
            if !mirror.starts_with("http://") && !mirror.starts_with("https://") {
                return Err(format!("mirror must be an http(s) URL: {}", mirror));
            }
        }
        if self.subtitles.default_language.trim().is_empty() {
            return Err("default_language must not be empty".to_string());
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err("cache max_entries must be greater than zero".to_string());
        }
        Ok(())
    }
}
