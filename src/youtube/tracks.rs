//! Caption track selection

use std::fmt;
use std::str::FromStr;

use super::player::CaptionTrack;
use crate::error::{Result, SubtitleError};

/// Which caption flavour the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleKind {
    /// Automatically generated (speech recognition)
    Auto,
    /// Uploaded by the channel
    Manual,
}

impl SubtitleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleKind::Auto => "auto",
            SubtitleKind::Manual => "manual",
        }
    }

    /// Value of the `type` parameter of the timedtext endpoint
    pub fn timedtext_type(&self) -> &'static str {
        match self {
            SubtitleKind::Auto => "asr",
            SubtitleKind::Manual => "track",
        }
    }
}

impl fmt::Display for SubtitleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtitleKind {
    type Err = SubtitleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SubtitleKind::Auto),
            "manual" => Ok(SubtitleKind::Manual),
            _ => Err(SubtitleError::InvalidSubtitleType(s.to_string())),
        }
    }
}

/// Pick the track matching `language` and `kind`. Falls back to the first
/// track when nothing matches.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    kind: SubtitleKind,
    language: &str,
) -> Result<&'a CaptionTrack> {
    for (i, track) in tracks.iter().enumerate() {
        tracing::debug!(
            "Track {}: language={} kind={:?} name={} auto={}",
            i,
            track.language_code,
            track.kind,
            track.display_name(),
            track.is_auto()
        );
    }

    let wanted_auto = kind == SubtitleKind::Auto;
    if let Some(track) = tracks
        .iter()
        .find(|t| t.language_code == language && t.is_auto() == wanted_auto)
    {
        return Ok(track);
    }

    let first = tracks.first().ok_or(SubtitleError::NoCaptionTracks)?;
    tracing::info!(
        "No {} '{}' track, using {} ({})",
        kind,
        language,
        first.language_code,
        first.display_name()
    );
    Ok(first)
}

/// Turn a track's `baseUrl` into an absolute URL on `base`.
///
/// Relative `api/...` and `/api/...` paths are joined onto `base`, and
/// absolute URLs on the public site are moved onto `base` when it differs.
pub fn resolve_track_url(base_url: &str, base: &str) -> String {
    const PUBLIC_SITE: &str = "https://www.youtube.com";

    let base = base.trim_end_matches('/');
    if base_url.starts_with("api/") || base_url.starts_with("/api/") {
        return format!("{}/{}", base, base_url.trim_start_matches('/'));
    }
    if base != PUBLIC_SITE {
        if let Some(path) = base_url.strip_prefix(PUBLIC_SITE) {
            return format!("{}{}", base, path);
        }
    }
    base_url.to_string()
}
