//! Source locator validation.
//!
//! Only single YouTube videos are accepted. The 11-character video id doubles
//! as the job id.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static SUPPORTED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.|m\.)?(youtube\.com|youtu\.be|youtube-nocookie\.com)/.+")
        .expect("valid regex")
});

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[?&]v=|/v/|/embed/|/shorts/|/live/|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)")
        .expect("valid regex")
});

const PLAYLIST_MARKERS: [&str; 4] = ["list=", "/playlist", "/p/", "RDCLAK5"];

/// Reasons a locator is rejected at submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Invalid YouTube URL format. Please provide a valid YouTube video URL.")]
    Unsupported { url: String },

    #[error("Playlist URLs are not supported. Please provide a direct video URL.")]
    Playlist { url: String },

    #[error("Invalid YouTube URL: could not find a video ID in {url}")]
    MissingVideoId { url: String },
}

/// A validated single-video locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
    url: String,
    video_id: String,
}

impl SourceLocator {
    /// Validates `url` and extracts its video id.
    pub fn parse(url: &str) -> Result<Self, LocatorError> {
        let url = url.trim();

        if !SUPPORTED_URL.is_match(url) {
            return Err(LocatorError::Unsupported {
                url: url.to_string(),
            });
        }

        if PLAYLIST_MARKERS.iter().any(|m| url.contains(m)) {
            return Err(LocatorError::Playlist {
                url: url.to_string(),
            });
        }

        let video_id = VIDEO_ID
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| LocatorError::MissingVideoId {
                url: url.to_string(),
            })?;

        Ok(Self {
            url: url.to_string(),
            video_id,
        })
    }

    /// The URL as submitted, trimmed.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The 11-character video id.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical watch URL, free of tracking parameters.
    pub fn canonical_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}
