//! Player response extraction
//!
//! The watch page embeds the player configuration as a JavaScript
//! assignment, `var ytInitialPlayerResponse = {...};`. We locate the
//! assignment and cut out the balanced JSON object that follows it.

use serde::{Deserialize, Serialize};

/// The parts of the player response we use
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub captions: Option<Captions>,
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracklistRenderer {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

/// One caption track offered by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    #[serde(default)]
    pub language_code: String,
    /// `asr` for automatic captions, absent for uploaded ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TrackName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub title: Option<String>,
    pub video_id: Option<String>,
}

impl CaptionTrack {
    /// Automatic speech recognition track
    pub fn is_auto(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// Human readable track name
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(TrackName {
                simple_text: Some(text),
                ..
            }) => text.clone(),
            Some(TrackName { runs, .. }) if !runs.is_empty() => {
                runs.iter().map(|r| r.text.as_str()).collect()
            }
            _ => "Unknown".to_string(),
        }
    }
}

impl PlayerResponse {
    /// Caption tracks, or `None` when the response carries no caption block.
    pub fn caption_tracks(&self) -> Option<&[CaptionTrack]> {
        self.captions
            .as_ref()?
            .renderer
            .as_ref()
            .map(|r| r.caption_tracks.as_slice())
    }

    pub fn title(&self) -> Option<&str> {
        self.video_details
            .as_ref()?
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

// Length of the JSON object at the start of `s`, honouring strings and escapes.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Raw JSON text of the embedded player response.
pub fn extract_player_json(html: &str) -> Option<&str> {
    let m = regex!(r"ytInitialPlayerResponse\s*=\s*\{").find(html)?;
    let start = m.end() - 1;
    let rest = &html[start..];
    balanced_object_len(rest).map(|len| &rest[..len])
}

/// Parse the embedded player response. Malformed JSON yields `None`.
pub fn extract_player_response(html: &str) -> Option<PlayerResponse> {
    let json = extract_player_json(html)?;
    match serde_json::from_str::<PlayerResponse>(json) {
        Ok(response) => {
            tracing::debug!("Successfully parsed player response ({} bytes)", json.len());
            Some(response)
        }
        Err(e) => {
            tracing::warn!("Failed to parse ytInitialPlayerResponse: {}", e);
            None
        }
    }
}
