//! Video title lookup
//!
//! The title is taken from the first source that has one:
//! player response, `<meta name="title">`, `<title>`, and finally a
//! generated `Video_<id>` placeholder. When the watch page cannot be fetched
//! at all, the oEmbed endpoint is asked instead.

use serde::{Deserialize, Serialize};

use super::player::extract_player_response;
use crate::upstream::UpstreamClient;
use crate::video_id::VideoId;

/// Where a title came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    JsonData,
    MetaTag,
    DocumentTitle,
    Default,
    OembedApi,
    Fallback,
}

/// Title information for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub video_id: String,
    pub source: TitleSource,
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: Option<String>,
}

pub fn default_title(id: &VideoId) -> String {
    format!("Video_{}", id)
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text.trim()).into_owned()
}

/// Find the title in a watch page.
pub fn title_from_html(html: &str) -> Option<(String, TitleSource)> {
    if let Some(title) = extract_player_response(html)
        .as_ref()
        .and_then(|p| p.title().map(str::to_string))
    {
        return Some((title, TitleSource::JsonData));
    }

    if let Some(caps) = regex!(r#"<meta\s+name="title"\s+content="([^"]+)""#).captures(html) {
        let title = decode(&caps[1]);
        if !title.is_empty() {
            return Some((title, TitleSource::MetaTag));
        }
    }

    if let Some(caps) = regex!(r"<title>([^<]+)</title>").captures(html) {
        let title = decode(&caps[1]);
        let title = title.strip_suffix("- YouTube").unwrap_or(&title).trim().to_string();
        if !title.is_empty() {
            return Some((title, TitleSource::DocumentTitle));
        }
    }

    None
}

async fn oembed_title(client: &UpstreamClient, id: &VideoId) -> Option<String> {
    let url = client.url(&format!(
        "/oembed?url=https://www.youtube.com/watch?v={}&format=json",
        id
    ));
    tracing::debug!("Trying oEmbed for video info: {}", url);

    let body = match client.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("oEmbed request failed: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<OembedResponse>(&body) {
        Ok(r) => r.title.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            tracing::warn!("oEmbed response is not valid JSON: {}", e);
            None
        }
    }
}

/// Look up the title of a video. Never fails; falls back to a placeholder.
pub async fn fetch_video_info(client: &UpstreamClient, id: &VideoId) -> VideoInfo {
    let url = client.url(&format!("/watch?v={}", id));
    tracing::info!("Fetching video info: {}", url);

    let (title, source) = match client.fetch(&url).await {
        Ok(html) => title_from_html(&html).unwrap_or_else(|| {
            tracing::info!("No title found in watch page, using default");
            (default_title(id), TitleSource::Default)
        }),
        Err(e) => {
            tracing::warn!("Failed to fetch watch page for {}: {}", id, e);
            match oembed_title(client, id).await {
                Some(title) => (title, TitleSource::OembedApi),
                None => (default_title(id), TitleSource::Fallback),
            }
        }
    };

    tracing::debug!("Title for {} from {:?}: {}", id, source, title);
    VideoInfo {
        title,
        video_id: id.to_string(),
        source,
    }
}
