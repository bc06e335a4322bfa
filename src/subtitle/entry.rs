//! Transcript parsing
//!
//! Parses timed-text transcripts of the form
//!
//! ```text
//! <transcript>
//!   <text start="0.21" dur="2.34">Hello world</text>
//! </transcript>
//! ```
//!
//! into timed entries.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtitleError};

/// A single timed caption line. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

// Timing attributes of a <text> element.
fn text_timing(e: &BytesStart) -> (Option<f64>, f64) {
    let mut start = None;
    let mut dur = 0.0;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"start" => start = value.trim().parse::<f64>().ok(),
            b"dur" => dur = value.trim().parse::<f64>().unwrap_or(0.0),
            _ => {}
        }
    }
    (start, dur)
}

/// Parse transcript XML into raw entries, in document order.
///
/// Entries without a usable `start` attribute are skipped. A missing `dur`
/// counts as zero. Text is returned exactly as found (after XML unescaping).
pub fn parse_transcript(xml: &str) -> Result<Vec<SubtitleEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut saw_root = false;

    // The entry being collected, if we're inside a <text> element.
    let mut current: Option<(Option<f64>, f64, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"transcript" => saw_root = true,
                b"text" if current.is_none() => {
                    let (start, dur) = text_timing(&e);
                    current = Some((start, dur, String::new()));
                    depth = 0;
                }
                _ if current.is_some() => depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"transcript" => saw_root = true,
                b"text" if current.is_none() => {
                    if let (Some(start), dur) = text_timing(&e) {
                        entries.push(SubtitleEntry::new(start, dur, String::new()));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some((_, _, text)) = current.as_mut() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        // Unknown entities (&nbsp; and friends) are left for
                        // the HTML decoder in clean_text.
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, _, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                if current.is_some() {
                    if depth > 0 {
                        depth -= 1;
                    } else if e.name().as_ref() == b"text" {
                        if let Some((start, dur, text)) = current.take() {
                            match start {
                                Some(start) => entries.push(SubtitleEntry::new(start, dur, text)),
                                None => tracing::debug!("Skipping caption line without start time"),
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SubtitleError::InvalidTranscript(format!(
                    "{} at position {}",
                    e,
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(SubtitleError::InvalidTranscript(
            "missing <transcript> root element".to_string(),
        ));
    }

    Ok(entries)
}

/// Decode entities and fold whitespace in a caption line.
pub fn clean_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let decoded = decoded.replace("\\n", " ");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean every entry, drop blank ones and order by start time.
pub fn process_entries(entries: Vec<SubtitleEntry>) -> Vec<SubtitleEntry> {
    let mut out: Vec<SubtitleEntry> = entries
        .into_iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| SubtitleEntry {
            text: clean_text(&e.text),
            ..e
        })
        .filter(|e| !e.text.is_empty())
        .collect();
    out.sort_by(|a, b| a.start.total_cmp(&b.start));
    out
}

/// Entry that is showing at time `t`.
pub fn find_at_time(entries: &[SubtitleEntry], t: f64) -> Option<&SubtitleEntry> {
    entries.iter().find(|e| t >= e.start && t < e.end())
}

/// Entries that start inside `[from, to)` or end inside `(from, to]`.
pub fn entries_in_range(entries: &[SubtitleEntry], from: f64, to: f64) -> Vec<SubtitleEntry> {
    entries
        .iter()
        .filter(|e| {
            (e.start >= from && e.start < to) || (e.end() > from && e.end() <= to)
        })
        .cloned()
        .collect()
}
