//! Subtitle file generation (WebVTT, SubRip, plain text)

use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

use super::entry::SubtitleEntry;
use crate::error::SubtitleError;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    Txt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Txt => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "text/vtt; charset=utf-8",
            SubtitleFormat::Srt => "application/x-subrip; charset=utf-8",
            SubtitleFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            "srt" => Ok(SubtitleFormat::Srt),
            "txt" | "text" => Ok(SubtitleFormat::Txt),
            _ => Err(SubtitleError::InvalidFormat(s.to_string())),
        }
    }
}

// Split seconds into (hours, minutes, seconds, millis). Rounds to the
// nearest millisecond; negative and NaN inputs clamp to zero.
fn split_time(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60, ms)
}

/// `HH:MM:SS.mmm`
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_time(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

/// `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_time(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// `MM:SS`, truncating fractional seconds. Minutes keep counting past 59.
pub fn format_clock(seconds: f64) -> String {
    let secs = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn write_cues(out: &mut String, entries: &[SubtitleEntry], stamp: fn(f64) -> String) {
    for (i, entry) in entries.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            stamp(entry.start),
            stamp(entry.end()),
            entry.text
        );
    }
}

pub fn to_vtt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    write_cues(&mut out, entries, format_vtt_timestamp);
    out
}

pub fn to_srt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    write_cues(&mut out, entries, format_srt_timestamp);
    out
}

pub fn to_txt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.text);
        out.push('\n');
    }
    out
}

/// Plain text with a `[MM:SS]` prefix on every line.
pub fn to_txt_timestamped(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "[{}] {}", format_clock(entry.start), entry.text);
    }
    out
}

/// Render entries in the requested format.
pub fn convert(entries: &[SubtitleEntry], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Vtt => to_vtt(entries),
        SubtitleFormat::Srt => to_srt(entries),
        SubtitleFormat::Txt => to_txt(entries),
    }
}

/// File name for a download: `<title>_subtitles.<ext>` with characters that
/// are unsafe in file names replaced by `_`.
pub fn safe_file_name(title: &str, format: SubtitleFormat) -> String {
    let title = title.trim();
    let title = if title.is_empty() { "video" } else { title };
    let safe: String = title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect();
    format!("{}_subtitles.{}", safe, format.extension())
}
