//! Caption retrieval
//!
//! Captions are fetched from the track URL advertised in the watch page.
//! If that fails, the timedtext endpoint is queried directly; its answer is
//! either transcript XML already or JSON that we rewrite into transcript XML.

use serde_json::Value;
use std::fmt::Write;

use super::player::{extract_player_response, CaptionTrack};
use super::tracks::{resolve_track_url, select_track, SubtitleKind};
use crate::error::{Result, SubtitleError, UpstreamError};
use crate::subtitle::parse_transcript;
use crate::upstream::UpstreamClient;
use crate::video_id::VideoId;

/// Fetch the watch page HTML.
pub async fn fetch_watch_page(client: &UpstreamClient, id: &VideoId) -> Result<String> {
    let url = client.url(&format!("/watch?v={}", id));
    tracing::info!("Fetching video page: {}", url);
    Ok(client.fetch(&url).await?)
}

/// Caption tracks advertised by the watch page.
pub async fn list_tracks(client: &UpstreamClient, id: &VideoId) -> Result<Vec<CaptionTrack>> {
    let html = fetch_watch_page(client, id).await?;
    let player = extract_player_response(&html).ok_or(SubtitleError::PlayerResponseNotFound)?;
    let tracks = player.caption_tracks().ok_or(SubtitleError::NoCaptions)?;
    if tracks.is_empty() {
        return Err(SubtitleError::NoCaptionTracks);
    }
    tracing::info!("Found {} caption track(s) for {}", tracks.len(), id);
    Ok(tracks.to_vec())
}

async fn fetch_from_watch_page(
    client: &UpstreamClient,
    id: &VideoId,
    kind: SubtitleKind,
    language: &str,
) -> Result<String> {
    let tracks = list_tracks(client, id).await?;
    let track = select_track(&tracks, kind, language)?;
    let url = resolve_track_url(&track.base_url, client.base());
    tracing::info!("Fetching captions: {}", url);

    let body = client.fetch(&url).await?;
    if body.trim().is_empty() {
        return Err(SubtitleError::EmptyTranscript);
    }
    // Consent and interstitial pages come back as 200 too.
    parse_transcript(&body)?;
    Ok(body)
}

async fn fetch_from_timedtext(
    client: &UpstreamClient,
    id: &VideoId,
    kind: SubtitleKind,
    language: &str,
) -> Result<String> {
    let url = client.url(&format!(
        "/api/timedtext?v={}&type={}&lang={}&fmt=srv1",
        id,
        kind.timedtext_type(),
        urlencoding::encode(language)
    ));
    tracing::info!("Trying timedtext endpoint: {}", url);

    let body = client.fetch(&url).await?;
    let xml = timedtext_to_xml(&body).ok_or(UpstreamError::Unrecognised(url))?;
    parse_transcript(&xml)?;
    Ok(xml)
}

/// Raw transcript XML for a video. Whatever is returned parses as a
/// transcript.
///
/// Errors from the watch page route take precedence: they describe why the
/// normal path failed, which is what the caller wants to see.
pub async fn fetch_caption_xml(
    client: &UpstreamClient,
    id: &VideoId,
    kind: SubtitleKind,
    language: &str,
) -> Result<String> {
    let primary_err = match fetch_from_watch_page(client, id, kind, language).await {
        Ok(xml) => return Ok(xml),
        Err(e) => e,
    };
    tracing::warn!("Failed to get captions from watch page: {}", primary_err);

    match fetch_from_timedtext(client, id, kind, language).await {
        Ok(xml) => Ok(xml),
        Err(e) => {
            tracing::warn!("Timedtext fallback failed: {}", e);
            Err(primary_err)
        }
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn push_line(xml: &mut String, start: f64, dur: f64, text: &str) {
    let _ = writeln!(
        xml,
        "  <text start=\"{}\" dur=\"{}\">{}</text>",
        start,
        dur,
        html_escape::encode_text(text)
    );
}

/// Normalise a timedtext response into transcript XML.
///
/// Accepts XML (returned unchanged), `{"events": [...]}` JSON and
/// `[{"start", "dur", "text"}]` JSON. Returns `None` for anything else and
/// for responses without a single caption line.
pub fn timedtext_to_xml(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains("<?xml") || trimmed.starts_with("<transcript") {
        return Some(body.to_string());
    }

    let data: Value = serde_json::from_str(trimmed).ok()?;
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?><transcript>\n");
    let mut lines = 0usize;

    if let Some(events) = data.get("events").and_then(Value::as_array) {
        for event in events {
            let (Some(start_ms), Some(segs)) = (
                event.get("tStartMs").and_then(number),
                event.get("segs").and_then(Value::as_array),
            ) else {
                continue;
            };
            let dur_ms = event.get("dDurationMs").and_then(number).unwrap_or(1000.0);
            let text: String = segs
                .iter()
                .filter_map(|s| s.get("utf8").and_then(Value::as_str))
                .collect();
            if text.trim().is_empty() {
                continue;
            }
            push_line(&mut xml, start_ms / 1000.0, dur_ms / 1000.0, &text);
            lines += 1;
        }
    } else if let Some(items) = data.as_array() {
        for item in items {
            let (Some(start), Some(text)) = (
                item.get("start").and_then(number),
                item.get("text").and_then(Value::as_str),
            ) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let dur = item.get("dur").and_then(number).unwrap_or(1.0);
            push_line(&mut xml, start, dur, text);
            lines += 1;
        }
    } else {
        return None;
    }

    if lines == 0 {
        return None;
    }
    xml.push_str("</transcript>");
    Some(xml)
}
