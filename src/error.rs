use thiserror::Error;

/// Main error type for the subtitle server
#[derive(Error, Debug)]
pub enum SubtitleError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Please enter a video link")]
    EmptyInput,

    #[error("Invalid YouTube video link: {0}")]
    InvalidUrl(String),

    #[error("Invalid subtitle type: {0}")]
    InvalidSubtitleType(String),

    #[error("Unsupported subtitle format: {0}")]
    InvalidFormat(String),

    #[error("Player response not found in watch page")]
    PlayerResponseNotFound,

    #[error("Caption information not found")]
    NoCaptions,

    #[error("This video has no caption tracks")]
    NoCaptionTracks,

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while talking to the upstream video site
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP error! status: {status} ({url})")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Unrecognised response from {0}")]
    Unrecognised(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SubtitleError>;
