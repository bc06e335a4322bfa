//! End-to-end subtitle download: link in, subtitle file out.

use crate::error::{Result, SubtitleError};
use crate::subtitle::format::to_txt_timestamped;
use crate::subtitle::{
    convert, entries_in_range, parse_transcript, process_entries, safe_file_name, SubtitleEntry,
    SubtitleFormat,
};
use crate::upstream::UpstreamClient;
use crate::video_id::VideoId;
use crate::youtube::{fetch_caption_xml, fetch_video_info, SubtitleKind};

/// What to download and how to render it
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub video: VideoId,
    pub kind: SubtitleKind,
    pub language: String,
    pub format: SubtitleFormat,
    /// Keep only entries overlapping `[from, to)` (seconds)
    pub window: Option<(f64, f64)>,
    /// Prefix text lines with `[MM:SS]`
    pub timestamps: bool,
}

/// A rendered subtitle file
#[derive(Debug, Clone)]
pub struct SubtitleFile {
    pub title: String,
    pub file_name: String,
    pub format: SubtitleFormat,
    pub entry_count: usize,
    pub content: String,
}

/// Parse and clean transcript XML.
pub fn transcript_entries(xml: &str) -> Result<Vec<SubtitleEntry>> {
    let entries = process_entries(parse_transcript(xml)?);
    if entries.is_empty() {
        return Err(SubtitleError::EmptyTranscript);
    }
    Ok(entries)
}

/// Render transcript XML into a subtitle file named after `title`.
pub fn render(title: &str, xml: &str, req: &DownloadRequest) -> Result<SubtitleFile> {
    let mut entries = transcript_entries(xml)?;
    if let Some((from, to)) = req.window {
        entries = entries_in_range(&entries, from, to);
    }

    let content = match req.format {
        SubtitleFormat::Txt if req.timestamps => to_txt_timestamped(&entries),
        format => convert(&entries, format),
    };

    Ok(SubtitleFile {
        title: title.to_string(),
        file_name: safe_file_name(title, req.format),
        format: req.format,
        entry_count: entries.len(),
        content,
    })
}

/// Fetch title and captions and render the file.
pub async fn download(client: &UpstreamClient, req: &DownloadRequest) -> Result<SubtitleFile> {
    let info = fetch_video_info(client, &req.video).await;
    let xml = fetch_caption_xml(client, &req.video, req.kind, &req.language).await?;
    let file = render(&info.title, &xml, req)?;
    tracing::info!(
        "Rendered {} {} entries for {} as {}",
        file.entry_count,
        req.kind,
        req.video,
        file.file_name
    );
    Ok(file)
}
