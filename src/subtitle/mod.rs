//! Subtitle handling
//!
//! This module turns timed-text transcripts into subtitle files:
//! - Transcript XML parsing into timed entries
//! - Text cleanup (entity decoding, whitespace folding)
//! - Time based lookup of entries
//! - WebVTT, SubRip and plain text generation

pub mod entry;
pub mod format;

pub use entry::{entries_in_range, find_at_time, parse_transcript, process_entries, SubtitleEntry};
pub use format::{convert, safe_file_name, SubtitleFormat};
