//! Test fixtures for integration tests
//!
//! Serves a small fake of the video site on a loopback port: a watch page
//! with an embedded player response, the timedtext endpoint and oEmbed.

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::collections::HashMap;

use crate::config::ServerConfig;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const TITLE: &str = "Never Gonna: Give You Up";

pub const MANUAL_XML: &str = r##"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.0">We&amp;#39;re no strangers</text>
<text start="2.5" dur="2.5">to love</text>
<text start="5" dur="1.5"><font color="#E5E5E5">You know</font> the rules</text>
</transcript>"##;

pub const AUTO_XML: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.4" dur="2.1">we&amp;#39;re no strangers to love</text>
</transcript>"#;

/// Serve `app` on an ephemeral loopback port; returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Player response with a manual and an automatic English track
pub fn player_response() -> serde_json::Value {
    let track_url = |extra: &str| {
        format!(
            "https://www.youtube.com/api/timedtext?v={}&lang=en{}",
            VIDEO_ID, extra
        )
    };
    serde_json::json!({
        "captions": {
            "playerCaptionsTracklistRenderer": {
                "captionTracks": [
                    {
                        "baseUrl": track_url(""),
                        "languageCode": "en",
                        "name": { "simpleText": "English" }
                    },
                    {
                        "baseUrl": track_url("&kind=asr"),
                        "languageCode": "en",
                        "kind": "asr",
                        "name": { "runs": [{ "text": "English (auto-generated)" }] }
                    }
                ]
            }
        },
        "videoDetails": { "videoId": VIDEO_ID, "title": TITLE }
    })
}

fn watch_page(player: Option<serde_json::Value>) -> String {
    let script = match player {
        Some(player) => format!(
            "<script>var ytInitialPlayerResponse = {};var meta = {{}};</script>",
            player
        ),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html><html><head><title>{} - YouTube</title></head><body>{}</body></html>",
        html_escape::encode_text(TITLE),
        script
    )
}

async fn timedtext(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("v").map(String::as_str) != Some(VIDEO_ID) {
        return (StatusCode::NOT_FOUND, String::new());
    }
    // Direct timedtext queries (`type=` instead of `kind=`) get JSON.
    if let Some(kind) = params.get("type") {
        let text = if kind == "asr" { "auto via json" } else { "manual via json" };
        let body = serde_json::json!({
            "events": [
                { "tStartMs": 1000, "dDurationMs": 1500, "segs": [{ "utf8": text }] },
                { "tStartMs": 3000, "segs": [{ "utf8": "\n" }] }
            ]
        });
        return (StatusCode::OK, body.to_string());
    }
    match params.get("kind").map(String::as_str) {
        Some("asr") => (StatusCode::OK, AUTO_XML.to_string()),
        _ => (StatusCode::OK, MANUAL_XML.to_string()),
    }
}

/// Fake video site with a working watch page.
pub fn fake_site() -> Router {
    Router::new()
        .route("/watch", get(|| async { Html(watch_page(Some(player_response()))) }))
        .route("/api/timedtext", get(timedtext))
}

/// Fake video site whose watch page lacks the player response, so captions
/// only come from the timedtext endpoint.
pub fn fake_site_without_player() -> Router {
    Router::new()
        .route("/watch", get(|| async { Html(watch_page(None)) }))
        .route("/api/timedtext", get(timedtext))
}

/// Player response for a video without any caption block
pub fn player_without_captions() -> serde_json::Value {
    serde_json::json!({ "videoDetails": { "videoId": VIDEO_ID, "title": TITLE } })
}

/// Player response whose caption block lists no tracks
pub fn player_with_no_tracks() -> serde_json::Value {
    serde_json::json!({
        "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [] } },
        "videoDetails": { "videoId": VIDEO_ID, "title": TITLE }
    })
}

/// Fake video site serving `player` on the watch page. Track URLs answer
/// with `track_body`; direct timedtext queries get JSON when
/// `timedtext_works`, otherwise 404.
pub fn fake_site_with(
    player: serde_json::Value,
    track_body: &'static str,
    timedtext_works: bool,
) -> Router {
    let page = watch_page(Some(player));
    Router::new()
        .route("/watch", get(move || async move { Html(page) }))
        .route(
            "/api/timedtext",
            get(move |query: Query<HashMap<String, String>>| async move {
                let direct = query.0.contains_key("type");
                if direct && !timedtext_works {
                    return (StatusCode::NOT_FOUND, String::new()).into_response();
                }
                if direct {
                    return timedtext(query).await.into_response();
                }
                (StatusCode::OK, track_body).into_response()
            }),
        )
}

/// Fake video site whose watch page is down; only oEmbed answers.
pub fn fake_site_oembed_only() -> Router {
    Router::new()
        .route("/watch", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route(
            "/oembed",
            get(|| async { axum::Json(serde_json::json!({ "title": "From oEmbed" })) }),
        )
}

/// Server config pointed at `base`, with fast retries.
pub fn config_for(base: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.upstream.base_url = base.to_string();
    config.upstream.max_retries = 0;
    config.upstream.retry_delay_ms = 1;
    config.upstream.timeout_secs = 5;
    config
}
