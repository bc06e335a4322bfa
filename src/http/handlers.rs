//! HTTP request handlers
//!
//! JSON API handlers keep the `{ "success": bool, ... }` envelope the browser
//! client expects, on errors too.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, RawQuery, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::download::{render, DownloadRequest};
use crate::error::{SubtitleError, UpstreamError};
use crate::state::AppState;
use crate::subtitle::{parse_transcript, process_entries, SubtitleEntry, SubtitleFormat};
use crate::video_id::{resolve_video_ref, VideoId};
use crate::youtube::{list_tracks, CaptionTrack, SubtitleKind, TitleSource};

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    BadGateway(String),
    InternalError(String),
    /// A caption lookup failed; echoes the request back to the client.
    Subtitles {
        status: StatusCode,
        error: String,
        video_id: String,
        subtitle_type: String,
    },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, failure(msg)),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, failure(msg)),
            HttpError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, failure(msg)),
            HttpError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, failure(msg)),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, failure(msg)),
            HttpError::Subtitles {
                status,
                error,
                video_id,
                subtitle_type,
            } => (
                status,
                serde_json::json!({
                    "success": false,
                    "error": error,
                    "videoId": video_id,
                    "subtitleType": subtitle_type,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn failure(msg: String) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": msg })
}

/// Status code for a failed caption lookup
fn lookup_status(err: &SubtitleError) -> StatusCode {
    match err {
        SubtitleError::NoCaptions
        | SubtitleError::NoCaptionTracks
        | SubtitleError::EmptyTranscript => StatusCode::NOT_FOUND,
        SubtitleError::Upstream(_)
        | SubtitleError::PlayerResponseNotFound
        | SubtitleError::InvalidTranscript(_) => StatusCode::BAD_GATEWAY,
        SubtitleError::EmptyInput
        | SubtitleError::InvalidUrl(_)
        | SubtitleError::InvalidSubtitleType(_)
        | SubtitleError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SubtitleError> for HttpError {
    fn from(err: SubtitleError) -> Self {
        let msg = err.to_string();
        match lookup_status(&err) {
            StatusCode::BAD_REQUEST => HttpError::BadRequest(msg),
            StatusCode::NOT_FOUND => HttpError::NotFound(msg),
            StatusCode::BAD_GATEWAY => HttpError::BadGateway(msg),
            _ => HttpError::InternalError(msg),
        }
    }
}

/// Caption lookup failure, with the request echoed back.
fn lookup_failed(err: SubtitleError, video_id: &VideoId, kind: SubtitleKind) -> HttpError {
    tracing::error!("Failed to get subtitles for {}: {}", video_id, err);
    HttpError::Subtitles {
        status: lookup_status(&err),
        error: err.to_string(),
        video_id: video_id.to_string(),
        subtitle_type: kind.to_string(),
    }
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, HttpError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| HttpError::BadRequest(e.body_text()))
}

/// Query string flag: `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
/// A bare `timestamps` (empty value) counts as set.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(de::Error::custom(format!("invalid flag value: {}", other))),
    }
}

fn require_video_id(video_id: Option<&str>) -> Result<VideoId, HttpError> {
    let raw = video_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HttpError::BadRequest("Missing video ID".to_string()))?;
    resolve_video_ref(raw).map_err(HttpError::from)
}

fn require_kind(subtitle_type: Option<&str>) -> Result<SubtitleKind, HttpError> {
    subtitle_type
        .ok_or_else(|| SubtitleError::InvalidSubtitleType(String::new()))
        .and_then(|s| s.parse::<SubtitleKind>())
        .map_err(|_| HttpError::BadRequest("Invalid subtitle type".to_string()))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("ytsub-server v", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResponse {
    pub success: bool,
    pub title: String,
    pub video_id: String,
    pub source: TitleSource,
}

/// Video title
/// GET /api/video-info?videoId=
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VideoQuery>, QueryRejection>,
) -> Result<Json<VideoInfoResponse>, HttpError> {
    let query = query_params(query)?;
    let id = require_video_id(query.video_id.as_deref())?;
    let info = state.video_info(&id).await;

    Ok(Json(VideoInfoResponse {
        success: true,
        title: info.title,
        video_id: info.video_id,
        source: info.source,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitlesQuery {
    pub video_id: Option<String>,
    pub subtitle_type: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtitlesResponse {
    pub success: bool,
    /// Raw transcript XML
    pub subtitles: String,
}

/// Raw caption XML
/// GET /api/subtitles?videoId=&subtitleType=auto|manual[&lang=]
pub async fn subtitles(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SubtitlesQuery>, QueryRejection>,
) -> Result<Json<SubtitlesResponse>, HttpError> {
    let query = query_params(query)?;
    let id = require_video_id(query.video_id.as_deref())?;
    let kind = require_kind(query.subtitle_type.as_deref())?;
    let language = query
        .lang
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(state.default_language())
        .to_string();

    let xml = state
        .caption_xml(&id, kind, &language)
        .await
        .map_err(|e| lookup_failed(e, &id, kind))?;

    Ok(Json(SubtitlesResponse {
        success: true,
        subtitles: xml,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracksResponse {
    pub success: bool,
    pub video_id: String,
    pub tracks: Vec<CaptionTrack>,
}

/// Available caption tracks
/// GET /api/tracks?videoId=
pub async fn tracks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VideoQuery>, QueryRejection>,
) -> Result<Json<TracksResponse>, HttpError> {
    let query = query_params(query)?;
    let id = require_video_id(query.video_id.as_deref())?;
    let tracks = list_tracks(&state.client, &id).await?;
    Ok(Json(TracksResponse {
        success: true,
        video_id: id.to_string(),
        tracks,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub xml_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    pub subtitles: Vec<SubtitleEntry>,
}

/// Transcript XML to cleaned entries
/// POST /api/parse-subtitles {"xmlData": "..."}
pub async fn parse_subtitles(
    body: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseResponse>, HttpError> {
    let Json(req) = body.map_err(|e| HttpError::BadRequest(e.body_text()))?;
    let xml = req
        .xml_data
        .filter(|x| !x.trim().is_empty())
        .ok_or_else(|| HttpError::BadRequest("Missing subtitle data".to_string()))?;

    let entries = parse_transcript(&xml).map_err(|e| {
        tracing::warn!("Failed to parse subtitles: {}", e);
        HttpError::Unprocessable(e.to_string())
    })?;

    Ok(Json(ParseResponse {
        success: true,
        subtitles: process_entries(entries),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub subtitle_type: Option<String>,
    pub format: Option<String>,
    pub lang: Option<String>,
    pub from: Option<f64>,
    pub to: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub timestamps: bool,
}

fn content_disposition(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Subtitle file download
/// GET /api/download?url=&subtitleType=&format=[&lang=&from=&to=&timestamps=]
pub async fn download(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, HttpError> {
    let query = query_params(query)?;
    let video = resolve_video_ref(query.url.as_deref().unwrap_or(""))?;
    let kind = require_kind(Some(query.subtitle_type.as_deref().unwrap_or("manual")))?;
    let format: SubtitleFormat = query.format.as_deref().unwrap_or("srt").parse()?;
    let window = match (query.from, query.to) {
        (None, None) => None,
        (from, to) => {
            let from = from.unwrap_or(0.0);
            let to = to.unwrap_or(f64::INFINITY);
            if !(to > from) {
                return Err(HttpError::BadRequest(format!(
                    "Empty time window: from={} to={}",
                    from, to
                )));
            }
            Some((from, to))
        }
    };

    let req = DownloadRequest {
        video,
        kind,
        language: query
            .lang
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| state.default_language().to_string()),
        format,
        window,
        timestamps: query.timestamps,
    };

    let info = state.video_info(&req.video).await;
    let file = state
        .caption_xml(&req.video, req.kind, &req.language)
        .await
        .and_then(|xml| render(&info.title, &xml, &req))
        .map_err(|e| lookup_failed(e, &req.video, req.kind))?;
    tracing::info!("Serving {} ({} entries)", file.file_name, file.entry_count);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(file.format.mime_type()),
    );
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&file.file_name));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok((headers, file.content).into_response())
}

fn sniff_content_type(body: &str) -> &'static str {
    let head = body.trim_start();
    if head.starts_with('{') || head.starts_with('[') {
        "application/json; charset=utf-8"
    } else if head.starts_with("<?xml") || head.starts_with("<transcript") {
        "text/xml; charset=utf-8"
    } else {
        "text/html; charset=utf-8"
    }
}

/// Passthrough to the video site, so one server can act as another's mirror
/// GET /youtube-proxy/{*path}
pub async fn youtube_proxy(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let mut target = state.client.url(&format!("/{}", path.trim_start_matches('/')));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(&query);
    }
    tracing::debug!("Proxying request to {}", target);

    // Direct route only: a mirror pointing back here must not loop.
    let body = state
        .client
        .fetch_with_retry(&target)
        .await
        .map_err(|e| match e {
            UpstreamError::Status { status: 404, .. } => HttpError::NotFound(e.to_string()),
            e => HttpError::BadGateway(e.to_string()),
        })?;

    let content_type = sniff_content_type(&body);
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Debug endpoint - cache statistics
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.cache.stats();

    Json(serde_json::json!({
        "cache": stats,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
