//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section except
//! `[server]` is optional and falls back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{CacheConfig, ServerConfig, SubtitleConfig, UpstreamConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Upstream settings
    pub upstream: Option<UpstreamSettings>,
    /// Cache settings
    pub cache: Option<CacheSettings>,
    /// Subtitle settings
    pub subtitles: Option<SubtitleSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub accept_language: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    /// Mirrors tried after the direct request fails
    pub mirrors: Option<Vec<String>>,
    /// Prefix proxies tried after the mirrors
    pub proxy_prefixes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub enabled: Option<bool>,
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// TTL for cached responses in seconds
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSettings {
    /// Preferred caption language code
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let upstream = UpstreamConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            upstream: Some(UpstreamSettings {
                base_url: Some(upstream.base_url),
                user_agent: Some(upstream.user_agent),
                cookie: Some(upstream.cookie),
                accept_language: Some(upstream.accept_language),
                max_retries: Some(upstream.max_retries),
                retry_delay_ms: Some(upstream.retry_delay_ms),
                timeout_secs: Some(upstream.timeout_secs),
                mirrors: Some(Vec::new()),
                proxy_prefixes: Some(Vec::new()),
            }),
            cache: Some(CacheSettings {
                enabled: Some(true),
                max_entries: 256,
                ttl_secs: 600,
            }),
            subtitles: Some(SubtitleSettings {
                default_language: "en".to_string(),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = UpstreamConfig::default();
        let up = self.upstream.unwrap_or_default();
        let upstream = UpstreamConfig {
            base_url: up.base_url.unwrap_or(defaults.base_url),
            user_agent: up.user_agent.unwrap_or(defaults.user_agent),
            cookie: up.cookie.unwrap_or(defaults.cookie),
            accept: defaults.accept,
            accept_language: up.accept_language.unwrap_or(defaults.accept_language),
            max_retries: up.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_ms: up.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            timeout_secs: up.timeout_secs.unwrap_or(defaults.timeout_secs),
            mirrors: up.mirrors.unwrap_or_default(),
            proxy_prefixes: up.proxy_prefixes.unwrap_or_default(),
        };

        let cache = match self.cache {
            Some(c) => CacheConfig {
                enabled: c.enabled.unwrap_or(true),
                max_entries: c.max_entries,
                ttl_secs: c.ttl_secs,
            },
            None => CacheConfig::default(),
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or_else(|| "pretty".to_string())),
            None => ("info".to_string(), "pretty".to_string()),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            upstream,
            cache,
            subtitles: self
                .subtitles
                .map(|s| SubtitleConfig {
                    default_language: s.default_language,
                })
                .unwrap_or_default(),
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
