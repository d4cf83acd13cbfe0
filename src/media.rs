// src/media.rs
// Neutral media types shared by the engine adapter, the queue and the presentation layer

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Video quality keys, highest first
pub const VIDEO_QUALITIES: [&str; 5] = ["best", "1080", "720", "480", "360"];

/// Audio bitrates in kbps, highest first
pub const AUDIO_QUALITIES: [&str; 3] = ["320", "192", "128"];

pub const DEFAULT_VIDEO_QUALITY: &str = "720";
pub const DEFAULT_AUDIO_QUALITY: &str = "192";

/// What to keep from the source media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFormat {
    VideoAudio,
    VideoOnly,
    AudioOnly,
}

impl Default for MediaFormat {
    fn default() -> Self {
        Self::VideoAudio
    }
}

impl MediaFormat {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "video_audio" => Ok(Self::VideoAudio),
            "video_only" => Ok(Self::VideoOnly),
            "audio_only" => Ok(Self::AudioOnly),
            other => Err(AppError::ValidationError(format!(
                "Unknown format: {} (expected video_audio, video_only or audio_only)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VideoAudio => "video_audio",
            Self::VideoOnly => "video_only",
            Self::AudioOnly => "audio_only",
        }
    }

    /// Quality keys accepted for this format
    pub fn qualities(&self) -> &'static [&'static str] {
        match self {
            Self::AudioOnly => &AUDIO_QUALITIES,
            Self::VideoAudio | Self::VideoOnly => &VIDEO_QUALITIES,
        }
    }

    pub fn default_quality(&self) -> &'static str {
        match self {
            Self::AudioOnly => DEFAULT_AUDIO_QUALITY,
            Self::VideoAudio | Self::VideoOnly => DEFAULT_VIDEO_QUALITY,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `quality` belongs to the domain of `format`
pub fn validate_quality(format: MediaFormat, quality: &str) -> Result<(), AppError> {
    if format.qualities().contains(&quality) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "Quality '{}' is not valid for {} (expected one of: {})",
            quality,
            format,
            format.qualities().join(", ")
        )))
    }
}

/// Human-readable label for a quality key
pub fn quality_label(format: MediaFormat, quality: &str) -> String {
    match (format, quality) {
        (MediaFormat::AudioOnly, q) => format!("{} kbps", q),
        (_, "best") => "Best Quality".to_string(),
        (_, q) => format!("{}p", q),
    }
}

/// One child of a playlist, as listed by a flat extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub url: Option<String>,
    pub title: String,
}

/// Read-only description of a video or playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub channel: String,
    /// Duration in seconds, 0 when unknown
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub url: String,
    pub is_playlist: bool,
    /// Empty unless `is_playlist`
    pub entries: Vec<PlaylistEntry>,
    /// 0 unless `is_playlist`
    pub playlist_count: usize,
}

impl Metadata {
    /// Format the duration as `H:MM:SS` or `M:SS`
    pub fn duration_display(&self) -> String {
        format_duration(self.duration)
    }
}

pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Options passed to the engine for a single download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub target_directory: PathBuf,
    pub format: MediaFormat,
    pub quality: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

/// Transient progress report from the engine. Only the latest one matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub downloaded_bytes: u64,
    /// Exact size or best-effort estimate, 0 when unknown
    pub total_bytes: u64,
    /// Bytes per second
    pub speed: Option<f64>,
    pub filename: Option<String>,
}

impl ProgressEvent {
    /// Completed fraction in `[0, 1]`, `None` while the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.phase == ProgressPhase::Finished {
            return Some(1.0);
        }
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.downloaded_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0))
    }
}
