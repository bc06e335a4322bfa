//! Video ID extraction from user supplied links.
//!
//! Accepted forms:
//!
//!   https://www.youtube.com/watch?v=<id>
//!   https://youtu.be/<id>
//!   https://www.youtube.com/live/<id>
//!   https://www.youtube.com/embed/<id>
//!   https://www.youtube.com/shorts/<id>
//!   <id>  (bare 11 character ID)

use std::fmt;
use url::Url;

use crate::error::{Result, SubtitleError};

/// A validated 11 character video ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap a string that looks like a video ID.
    pub fn parse(s: &str) -> Option<Self> {
        is_video_id(s).then(|| VideoId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check the ID alphabet and length.
pub fn is_video_id(s: &str) -> bool {
    regex!(r"^[A-Za-z0-9_-]{11}$").is_match(s)
}

fn is_youtube_host(host: &str) -> bool {
    regex!(r"^(www\.|m\.)?(youtube\.com|youtu\.be)$").is_match(host)
}

/// Extract the video ID from a YouTube URL. Does not validate the ID itself.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;

    if host.contains("youtu.be") {
        return url
            .path_segments()
            .and_then(|mut s| s.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    if !host.contains("youtube.com") {
        return None;
    }

    let path = url.path();
    for prefix in ["/live/", "/embed/", "/shorts/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            return rest
                .split('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
}

/// True if `url` is a YouTube link carrying a well-formed video ID.
pub fn is_valid_youtube_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) if is_youtube_host(host) => {}
        _ => return false,
    }
    extract_video_id(url).is_some_and(|id| is_video_id(&id))
}

/// Turn user input (a link or a bare ID) into a video ID.
pub fn resolve_video_ref(input: &str) -> Result<VideoId> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SubtitleError::EmptyInput);
    }
    if let Some(id) = VideoId::parse(input) {
        return Ok(id);
    }
    if !is_valid_youtube_url(input) {
        return Err(SubtitleError::InvalidUrl(input.to_string()));
    }
    extract_video_id(input)
        .and_then(|id| VideoId::parse(&id))
        .ok_or_else(|| SubtitleError::InvalidUrl(input.to_string()))
}
