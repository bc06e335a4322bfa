//! End-to-end tests: HTTP API in front, fake video site behind.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::util::ServiceExt;

use super::fixtures::*;
use crate::download::{download, DownloadRequest};
use crate::http::create_router;
use crate::state::AppState;
use crate::subtitle::SubtitleFormat;
use crate::upstream::UpstreamClient;
use crate::video_id::VideoId;
use crate::youtube::{fetch_video_info, SubtitleKind, TitleSource};

async fn app_for(site: Router) -> (Router, Arc<AppState>) {
    let base = spawn_upstream(site).await;
    let state = Arc::new(AppState::new(config_for(&base)).unwrap());
    (create_router(state.clone()), state)
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_video_info_from_player_response() {
    let (app, _) = app_for(fake_site()).await;

    let response = get(&app, &format!("/api/video-info?videoId={}", VIDEO_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["title"], TITLE);
    assert_eq!(body["videoId"], VIDEO_ID);
    assert_eq!(body["source"], "json_data");
}

#[tokio::test]
async fn test_video_info_from_document_title() {
    let (app, _) = app_for(fake_site_without_player()).await;

    let body = body_json(get(&app, &format!("/api/video-info?videoId={}", VIDEO_ID)).await).await;
    assert_eq!(body["title"], TITLE);
    assert_eq!(body["source"], "document_title");
}

#[tokio::test]
async fn test_video_info_from_oembed() {
    let base = spawn_upstream(fake_site_oembed_only()).await;
    let client = UpstreamClient::new(&config_for(&base).upstream).unwrap();
    let id = VideoId::parse(VIDEO_ID).unwrap();

    let info = fetch_video_info(&client, &id).await;
    assert_eq!(info.title, "From oEmbed");
    assert_eq!(info.source, TitleSource::OembedApi);
}

#[tokio::test]
async fn test_video_info_fallback_title() {
    // Watch page and oEmbed both missing
    let base = spawn_upstream(Router::new()).await;
    let client = UpstreamClient::new(&config_for(&base).upstream).unwrap();
    let id = VideoId::parse(VIDEO_ID).unwrap();

    let info = fetch_video_info(&client, &id).await;
    assert_eq!(info.title, format!("Video_{}", VIDEO_ID));
    assert_eq!(info.source, TitleSource::Fallback);
}

#[tokio::test]
async fn test_subtitles_manual_and_auto() {
    let (app, _) = app_for(fake_site()).await;

    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);
    let body = body_json(get(&app, &uri).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["subtitles"], MANUAL_XML);

    let uri = format!("/api/subtitles?videoId={}&subtitleType=auto&lang=en", VIDEO_ID);
    let body = body_json(get(&app, &uri).await).await;
    assert_eq!(body["subtitles"], AUTO_XML);
}

#[tokio::test]
async fn test_subtitles_are_cached() {
    let (app, state) = app_for(fake_site()).await;
    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);

    assert_eq!(get(&app, &uri).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri).await.status(), StatusCode::OK);

    let stats = state.cache.stats();
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_subtitles_from_timedtext_fallback() {
    let (app, _) = app_for(fake_site_without_player()).await;

    let uri = format!("/api/subtitles?videoId={}&subtitleType=auto", VIDEO_ID);
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let xml = body["subtitles"].as_str().unwrap();
    assert!(xml.contains(r#"<text start="1" dur="1.5">auto via json</text>"#));
    assert!(!xml.contains("start=\"3\""));
}

#[tokio::test]
async fn test_subtitles_unknown_video() {
    let (app, _) = app_for(Router::new()).await;

    let uri = "/api/subtitles?videoId=aaaaaaaaaaa&subtitleType=manual";
    let response = get(&app, uri).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["videoId"], "aaaaaaaaaaa");
    assert_eq!(body["subtitleType"], "manual");
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_tracks() {
    let (app, _) = app_for(fake_site()).await;

    let body = body_json(get(&app, &format!("/api/tracks?videoId={}", VIDEO_ID)).await).await;
    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["languageCode"], "en");
    assert_eq!(tracks[1]["kind"], "asr");
}

#[tokio::test]
async fn test_fetch_then_parse() {
    let (app, _) = app_for(fake_site()).await;

    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);
    let xml = body_json(get(&app, &uri).await).await["subtitles"].clone();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/parse-subtitles")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "xmlData": xml }).to_string()))
        .unwrap();
    let body = body_json(app.clone().oneshot(request).await.unwrap()).await;

    let subs = body["subtitles"].as_array().unwrap();
    assert_eq!(subs.len(), 3);
    assert_eq!(subs[0]["text"], "We're no strangers");
    assert_eq!(subs[2]["text"], "You know the rules");
    assert_eq!(subs[2]["duration"], 1.5);
}

#[tokio::test]
async fn test_download_srt() {
    let (app, _) = app_for(fake_site()).await;

    let uri = format!(
        "/api/download?url=https%3A%2F%2Fyoutu.be%2F{}&subtitleType=manual&format=srt",
        VIDEO_ID
    );
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-subrip; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"Never Gonna_ Give You Up_subtitles.srt\""));

    let body = body_text(response).await;
    assert!(body.starts_with("1\n00:00:00,500 --> 00:00:02,500\nWe're no strangers\n\n"));
    assert!(body.contains("3\n00:00:05,000 --> 00:00:06,500\nYou know the rules\n"));
}

#[tokio::test]
async fn test_download_vtt_window() {
    let (app, _) = app_for(fake_site()).await;

    let uri = format!(
        "/api/download?url={}&subtitleType=manual&format=vtt&from=2&to=4",
        VIDEO_ID
    );
    let response = get(&app, &uri).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/vtt; charset=utf-8");

    let body = body_text(response).await;
    assert!(body.starts_with("WEBVTT\n\n"));
    assert!(body.contains("to love"));
    assert!(!body.contains("You know the rules"));
}

#[tokio::test]
async fn test_download_no_captions() {
    let (app, _) = app_for(Router::new().route(
        "/watch",
        axum::routing::get(|| async { "<html><title>Quiet - YouTube</title></html>" }),
    ))
    .await;

    let uri = format!("/api/download?url={}&format=txt", VIDEO_ID);
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_download_pipeline() {
    let base = spawn_upstream(fake_site()).await;
    let client = UpstreamClient::new(&config_for(&base).upstream).unwrap();

    let req = DownloadRequest {
        video: VideoId::parse(VIDEO_ID).unwrap(),
        kind: SubtitleKind::Auto,
        language: "en".to_string(),
        format: SubtitleFormat::Txt,
        window: None,
        timestamps: true,
    };
    let file = download(&client, &req).await.unwrap();

    assert_eq!(file.title, TITLE);
    assert_eq!(file.file_name, "Never Gonna_ Give You Up_subtitles.txt");
    assert_eq!(file.entry_count, 1);
    assert_eq!(file.content, "[00:00] we're no strangers to love\n");
}

async fn assert_not_found(app: &Router, kind: &str) {
    let uri = format!("/api/subtitles?videoId={}&subtitleType={}", VIDEO_ID, kind);
    let response = get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["videoId"], VIDEO_ID);
    assert_eq!(body["subtitleType"], kind);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let uri = format!("/api/download?url={}&subtitleType={}&format=vtt", VIDEO_ID, kind);
    let response = get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["videoId"], VIDEO_ID);
    assert_eq!(body["subtitleType"], kind);
}

#[tokio::test]
async fn test_no_caption_block_is_not_found() {
    let (app, _) = app_for(fake_site_with(player_without_captions(), MANUAL_XML, false)).await;
    assert_not_found(&app, "manual").await;
}

#[tokio::test]
async fn test_empty_track_list_is_not_found() {
    let (app, _) = app_for(fake_site_with(player_with_no_tracks(), MANUAL_XML, false)).await;
    assert_not_found(&app, "auto").await;
}

#[tokio::test]
async fn test_empty_track_body_is_not_found() {
    let (app, state) = app_for(fake_site_with(player_response(), "", false)).await;
    assert_not_found(&app, "manual").await;
    assert_eq!(state.cache.stats().entry_count, 0);
}

#[tokio::test]
async fn test_consent_page_is_not_cached() {
    let consent = "<html><body>Before you continue to YouTube</body></html>";
    let (app, state) = app_for(fake_site_with(player_response(), consent, false)).await;

    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["success"], false);
    assert_eq!(state.cache.stats().entry_count, 0);
}

#[tokio::test]
async fn test_consent_page_falls_back_to_timedtext() {
    let consent = "<html><body>Before you continue to YouTube</body></html>";
    let (app, _) = app_for(fake_site_with(player_response(), consent, true)).await;

    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);
    let body = body_json(get(&app, &uri).await).await;
    assert_eq!(body["success"], true);
    assert!(body["subtitles"].as_str().unwrap().contains("manual via json"));
}

#[tokio::test]
async fn test_download_timestamps_flag() {
    let (app, _) = app_for(fake_site()).await;

    let uri = format!(
        "/api/download?url={}&subtitleType=manual&format=txt&timestamps=1",
        VIDEO_ID
    );
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.starts_with("[00:00] We're no strangers\n"));
    assert!(body.contains("[00:05] You know the rules\n"));
}

#[tokio::test]
async fn test_proxy_route_passes_through() {
    let (app, _) = app_for(fake_site()).await;

    let response = get(&app, &format!("/youtube-proxy/watch?v={}", VIDEO_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("ytInitialPlayerResponse"));

    let response = get(&app, "/youtube-proxy/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_as_mirror() {
    // A second server proxies the fake site and stands in as the mirror
    // of one whose direct upstream is down.
    let (proxy_app, _) = app_for(fake_site()).await;
    let proxy_base = spawn_upstream(proxy_app).await;

    let dead = spawn_upstream(Router::new()).await;
    let mut config = config_for(&dead);
    config.upstream.mirrors = vec![format!("{}/youtube-proxy", proxy_base)];
    let app = create_router(Arc::new(AppState::new(config).unwrap()));

    let uri = format!("/api/subtitles?videoId={}&subtitleType=manual", VIDEO_ID);
    let body = body_json(get(&app, &uri).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["subtitles"], MANUAL_XML);
}
