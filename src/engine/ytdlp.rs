// src/engine/ytdlp.rs
// MediaEngine backed by the yt-dlp executable

use super::format::{download_args, metadata_args};
use super::progress::parse_progress_line;
use super::MediaEngine;
use crate::cancel::CancellationFlag;
use crate::error::{AppError, DownloadError};
use crate::media::{DownloadOptions, Metadata, PlaylistEntry, ProgressEvent};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as AsyncCommand};

/// How often the cancellation flag is polled when yt-dlp prints nothing
const CANCELLATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of non-progress stderr lines kept for error reporting
const STDERR_TAIL_LINES: usize = 20;

/// Subset of the `--dump-single-json` payload we read
#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    #[serde(rename = "_type")]
    kind: Option<String>,
    entries: Option<Vec<Option<RawEntry>>>,
    playlist_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    url: Option<String>,
    webpage_url: Option<String>,
    title: Option<String>,
}

/// Runs yt-dlp as a child process
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn not_found_message(&self) -> String {
        format!(
            "{} executable not found. Please ensure it's installed and in your PATH.",
            self.binary.display()
        )
    }
}

#[async_trait]
impl MediaEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<Metadata, AppError> {
        debug!("Fetching metadata for {}", url);
        let output = AsyncCommand::new(&self.binary)
            .args(metadata_args(url))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => AppError::MissingDependency(self.not_found_message()),
                _ => AppError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            return Err(AppError::MetadataFetch(engine_error_text(&lines, output.status)));
        }

        parse_metadata(&String::from_utf8_lossy(&output.stdout), url)
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
        cancel: &CancellationFlag,
    ) -> Result<(), DownloadError> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        tokio::fs::create_dir_all(&options.target_directory)
            .await
            .map_err(|e| {
                DownloadError::Engine(format!(
                    "Cannot create download directory {}: {}",
                    options.target_directory.display(),
                    e
                ))
            })?;

        let args = download_args(url, options);
        debug!("Running {} {:?}", self.binary.display(), args);

        let mut child = AsyncCommand::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DownloadError::Engine(self.not_found_message()),
                _ => DownloadError::Engine(format!(
                    "Failed to execute {}: {}",
                    self.binary.display(),
                    e
                )),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Engine("yt-dlp stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Engine("yt-dlp stderr unavailable".to_string()))?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES + 1);
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut ticker = tokio::time::interval(CANCELLATION_POLL_INTERVAL);

        while !(stdout_done && stderr_done) {
            let line = tokio::select! {
                _ = ticker.tick() => {
                    if cancel.is_cancelled() {
                        return Err(abort(&mut child).await);
                    }
                    continue;
                }
                res = out_lines.next_line(), if !stdout_done => match res {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        stdout_done = true;
                        continue;
                    }
                    Err(e) => {
                        warn!("Error reading yt-dlp stdout: {}", e);
                        stdout_done = true;
                        continue;
                    }
                },
                res = err_lines.next_line(), if !stderr_done => match res {
                    Ok(Some(line)) => {
                        if parse_progress_line(&line).is_none() && !line.trim().is_empty() {
                            stderr_tail.push_back(line.clone());
                            if stderr_tail.len() > STDERR_TAIL_LINES {
                                stderr_tail.pop_front();
                            }
                        }
                        line
                    }
                    Ok(None) => {
                        stderr_done = true;
                        continue;
                    }
                    Err(e) => {
                        warn!("Error reading yt-dlp stderr: {}", e);
                        stderr_done = true;
                        continue;
                    }
                },
            };

            match parse_progress_line(&line) {
                Some(event) => {
                    if cancel.is_cancelled() {
                        return Err(abort(&mut child).await);
                    }
                    progress(event);
                }
                None => debug!("yt-dlp: {}", line),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::Engine(format!("Failed to complete download: {}", e)))?;

        if status.success() {
            Ok(())
        } else if cancel.is_cancelled() {
            Err(DownloadError::Cancelled)
        } else {
            Err(DownloadError::Engine(engine_error_text(stderr_tail.make_contiguous(), status)))
        }
    }
}

async fn abort(child: &mut Child) -> DownloadError {
    info!("Cancellation requested, stopping yt-dlp");
    if let Err(e) = child.start_kill() {
        warn!("Failed to kill yt-dlp process: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap yt-dlp process: {}", e);
    }
    DownloadError::Cancelled
}

/// Pick the message shown to the user: the last `ERROR:` line, else the last
/// stderr line, else the exit status.
pub fn engine_error_text<S: AsRef<str>>(stderr_lines: &[S], status: ExitStatus) -> String {
    let lines: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| format!("yt-dlp failed ({})", status))
}

/// Convert yt-dlp JSON into `Metadata`. `requested_url` is used when the
/// payload carries no canonical URL.
pub fn parse_metadata(json: &str, requested_url: &str) -> Result<Metadata, AppError> {
    let raw: RawInfo = serde_json::from_str(json.trim())
        .map_err(|e| AppError::MetadataFetch(format!("Unreadable yt-dlp output: {}", e)))?;

    let is_playlist = raw.kind.as_deref() == Some("playlist");
    let entries: Vec<PlaylistEntry> = if is_playlist {
        raw.entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|entry| PlaylistEntry {
                url: non_empty(entry.url).or_else(|| non_empty(entry.webpage_url)),
                title: non_empty(entry.title).unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect()
    } else {
        Vec::new()
    };
    let playlist_count = if is_playlist {
        raw.playlist_count
            .map(|count| count as usize)
            .unwrap_or(entries.len())
    } else {
        0
    };

    Ok(Metadata {
        title: non_empty(raw.title).unwrap_or_else(|| "Unknown".to_string()),
        channel: non_empty(raw.channel)
            .or_else(|| non_empty(raw.uploader))
            .unwrap_or_else(|| "Unknown".to_string()),
        duration: raw
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u64)
            .unwrap_or(0),
        thumbnail: non_empty(raw.thumbnail),
        url: non_empty(raw.webpage_url).unwrap_or_else(|| requested_url.to_string()),
        is_playlist,
        entries,
        playlist_count,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
