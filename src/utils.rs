// src/utils.rs

use crate::error::AppError;
use humansize::{format_size, BINARY};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command as ShellCommand, Stdio};

/// Longest URL accepted
pub const MAX_URL_LENGTH: usize = 4096;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_\+.,~#?&/=!*';\[\]]*)$")
        .expect("URL pattern is valid")
});

/// Characters never legitimate in a media URL
const UNUSUAL_CHARS: [char; 8] = ['<', '>', '\\', '{', '}', '^', '`', '|'];

/// Check that `url` looks like an http(s) URL before handing it to the engine
pub fn validate_url(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::ValidationError("URL is empty".to_string()));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(AppError::ValidationError(
            "URL exceeds maximum allowed length".to_string(),
        ));
    }

    if url.chars().any(|c| UNUSUAL_CHARS.contains(&c) || c.is_whitespace()) {
        return Err(AppError::ValidationError(
            "URL contains unusual characters".to_string(),
        ));
    }

    if !URL_REGEX.is_match(url) {
        return Err(AppError::ValidationError(format!(
            "Invalid URL format: {}",
            url
        )));
    }

    Ok(())
}

/// Create the download directory when missing and return it
pub fn ensure_download_dir(dir: &Path) -> Result<PathBuf, AppError> {
    if dir.as_os_str().is_empty() {
        return Err(AppError::PathError(
            "Download directory is empty".to_string(),
        ));
    }
    if dir.exists() && !dir.is_dir() {
        return Err(AppError::PathError(format!(
            "{} exists and is not a directory",
            dir.display()
        )));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        debug!("Created directory: {:?}", dir);
    }
    Ok(dir.to_path_buf())
}

/// Check if a dependency is installed by searching for it in PATH
pub fn is_dependency_installed(name: &str) -> Result<bool, AppError> {
    let command = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let status = ShellCommand::new(command)
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(AppError::IoError)?;

    Ok(status.success())
}

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// `downloaded / total`, or `downloaded / Unknown` while the total is unknown
pub fn format_progress_bytes(downloaded: u64, total: u64) -> String {
    if total == 0 {
        format!("{} / Unknown", format_bytes(downloaded))
    } else {
        format!("{} / {}", format_bytes(downloaded), format_bytes(total))
    }
}

pub fn format_speed(bytes_per_second: Option<f64>) -> String {
    match bytes_per_second {
        Some(speed) if speed > 0.0 => format!("{}/s", format_size(speed as u64, BINARY)),
        _ => "-- /s".to_string(),
    }
}

/// Shorten `text` to `max_chars`, ending in `...` when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
