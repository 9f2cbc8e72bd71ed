//! YouTube link detection.

use regex::Regex;
use std::sync::LazyLock;

/// Watch, embed, `/v/` and short-link forms, with optional scheme and
/// `www.`/`m.` subdomain. Group 5 is the video id.
static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:https?:)?//)?((?:www|m)\.)?(youtube\.com|youtu\.be)(/(?:[A-Za-z0-9_-]+\?v=|embed/|v/)?)([A-Za-z0-9_-]+)(\S+)?$",
    )
    .unwrap()
});

/// A video preview queued while rewriting a post's links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEmbed {
    /// YouTube video id.
    pub id: String,
    /// The expanded link the card points at.
    pub url: String,
}

impl VideoEmbed {
    /// Medium-quality thumbnail for the video.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.id)
    }
}

/// Extract the video id if `url` points at a YouTube video.
#[must_use]
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(5))
        .map(|m| m.as_str())
}
