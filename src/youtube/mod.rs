//! Video site scraping
//!
//! - Player response extraction from the watch page
//! - Caption track listing and selection
//! - Caption XML retrieval with a timedtext fallback
//! - Title lookup

pub mod captions;
pub mod info;
pub mod player;
pub mod tracks;

pub use captions::{fetch_caption_xml, list_tracks};
pub use info::{fetch_video_info, TitleSource, VideoInfo};
pub use player::CaptionTrack;
pub use tracks::SubtitleKind;
