//! Subtitle Download Server
//!
//! Downloads the captions of a video from its share link and converts them
//! to WebVTT, SubRip or plain text. Runs as an HTTP API for the browser
//! client, or one-shot from the command line.

#![allow(dead_code)]

#[macro_use]
mod macros;

mod config;
mod config_file;
mod download;
mod error;
mod http;
#[cfg(test)]
mod integration;
mod state;
mod subtitle;
mod upstream;
mod video_id;
mod youtube;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::download::{download, DownloadRequest};
use crate::error::{Result, SubtitleError};
use crate::http::create_router;
use crate::state::AppState;
use crate::subtitle::SubtitleFormat;
use crate::upstream::UpstreamClient;
use crate::video_id::resolve_video_ref;
use crate::youtube::{list_tracks, SubtitleKind};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "ytsub-server";

#[derive(Parser, Debug)]
#[command(name = "ytsub-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Download subtitles for one video
    Fetch {
        /// Video link or bare video ID
        url: String,
        /// auto or manual
        #[arg(long = "type", default_value = "manual")]
        kind: SubtitleKind,
        /// vtt, srt or txt
        #[arg(short, long, default_value = "srt")]
        format: SubtitleFormat,
        /// Caption language (defaults to the configured language)
        #[arg(short, long)]
        lang: Option<String>,
        /// Only keep captions from this many seconds on
        #[arg(long)]
        from: Option<f64>,
        /// Only keep captions up to this many seconds
        #[arg(long)]
        to: Option<f64>,
        /// Prefix plain text lines with [MM:SS]
        #[arg(long)]
        timestamps: bool,
        /// Output path; `-` writes to stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the caption tracks of a video
    Tracks {
        /// Video link or bare video ID
        url: String,
    },
    /// Write a default configuration file
    InitConfig {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, load_warning) = load_config(&args.config);
    init_logging(&config);
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }
    config.validate().map_err(SubtitleError::Config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Fetch {
            url,
            kind,
            format,
            lang,
            from,
            to,
            timestamps,
            output,
        } => {
            let window = match (from, to) {
                (None, None) => None,
                (from, to) => Some((from.unwrap_or(0.0), to.unwrap_or(f64::INFINITY))),
            };
            let req = DownloadRequest {
                video: resolve_video_ref(&url)?,
                kind,
                language: lang.unwrap_or_else(|| config.subtitles.default_language.clone()),
                format,
                window,
                timestamps,
            };
            fetch(&config, &req, output.as_deref()).await
        }
        Command::Tracks { url } => tracks(&config, &url).await,
        Command::InitConfig { path } => {
            crate::config_file::generate_default_config(&path)
                .map_err(|e| SubtitleError::Config(e.to_string()))?;
            tracing::info!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Load the config file, falling back to defaults. The warning is returned
/// rather than logged because logging depends on the config.
fn load_config(path: &Path) -> (ServerConfig, Option<String>) {
    if !path.exists() {
        return (ServerConfig::default(), None);
    }
    match crate::config_file::ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), None),
        Err(e) => (
            ServerConfig::default(),
            Some(format!(
                "Failed to load config file {}: {}. Using defaults.",
                path.display(),
                e
            )),
        ),
    }
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "ytsub_server={},tower_http={}",
            config.log_level, config.log_level
        )
        .into()
    });

    // stdout is reserved for `fetch -o -`
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!("Configuration loaded: {:?}", config);

    let addr: SocketAddr = config.socket_addr().parse().map_err(|e| {
        SubtitleError::Config(format!("invalid listen address {}: {}", config.socket_addr(), e))
    })?;

    // Create application state
    let state = Arc::new(AppState::new(config)?);

    // Build router
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn fetch(config: &ServerConfig, req: &DownloadRequest, output: Option<&str>) -> Result<()> {
    let client = UpstreamClient::new(&config.upstream)?;
    let file = download(&client, req).await?;

    match output {
        Some("-") => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(file.content.as_bytes())?;
            stdout.flush()?;
        }
        Some(path) => {
            std::fs::write(path, &file.content)?;
            tracing::info!("Saved {} captions to {}", file.entry_count, path);
        }
        None => {
            std::fs::write(&file.file_name, &file.content)?;
            tracing::info!("Saved {} captions to {}", file.entry_count, file.file_name);
        }
    }
    Ok(())
}

async fn tracks(config: &ServerConfig, url: &str) -> Result<()> {
    let client = UpstreamClient::new(&config.upstream)?;
    let id = resolve_video_ref(url)?;
    let tracks = list_tracks(&client, &id).await?;

    let mut stdout = std::io::stdout().lock();
    for track in tracks {
        let kind = if track.is_auto() {
            SubtitleKind::Auto
        } else {
            SubtitleKind::Manual
        };
        writeln!(
            stdout,
            "{}\t{}\t{}",
            track.language_code,
            kind,
            track.display_name()
        )?;
    }
    Ok(())
}
