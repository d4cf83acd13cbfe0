// src/config.rs
// Persistent user settings

use crate::error::AppError;
use crate::media::{validate_quality, MediaFormat, DEFAULT_AUDIO_QUALITY, DEFAULT_VIDEO_QUALITY};
use crate::worker::CancelPolicy;
use dirs_next as dirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tubeloader";
const SETTINGS_FILE: &str = "settings.json";

/// Default capacity of the notification channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// User settings. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where downloads are written
    pub output_dir: PathBuf,
    pub default_format: MediaFormat,
    pub default_video_quality: String,
    pub default_audio_quality: String,
    pub cancel_policy: CancelPolicy,
    /// yt-dlp executable, looked up in PATH when not absolute
    pub ytdlp_path: PathBuf,
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_format: MediaFormat::default(),
            default_video_quality: DEFAULT_VIDEO_QUALITY.to_string(),
            default_audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
            cancel_policy: CancelPolicy::default(),
            ytdlp_path: PathBuf::from("yt-dlp"),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Settings {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the per-user settings file
    pub fn load_default() -> Result<Self, AppError> {
        Self::load(&settings_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Quality used when the user names none
    pub fn default_quality(&self, format: MediaFormat) -> &str {
        match format {
            MediaFormat::AudioOnly => &self.default_audio_quality,
            MediaFormat::VideoAudio | MediaFormat::VideoOnly => &self.default_video_quality,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_quality(MediaFormat::VideoAudio, &self.default_video_quality)?;
        validate_quality(MediaFormat::AudioOnly, &self.default_audio_quality)?;
        if self.channel_capacity == 0 {
            return Err(AppError::ValidationError(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/tubeloader/settings.json`
pub fn settings_path() -> Result<PathBuf, AppError> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| AppError::PathError("Could not find config directory".to_string()))?;
    path.push(APP_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}

/// `~/Downloads`, or `./downloads` when there is no home directory
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}
