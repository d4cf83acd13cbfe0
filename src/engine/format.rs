// src/engine/format.rs
// yt-dlp format selectors and argument lists

use crate::engine::progress::PROGRESS_TEMPLATE;
use crate::media::{DownloadOptions, MediaFormat};

/// Codec audio-only downloads are re-encoded to
pub const AUDIO_CODEC: &str = "mp3";

/// Container preferred for video tracks and merged output
pub const VIDEO_CONTAINER: &str = "mp4";

/// Build the `-f` selector for a format/quality pair.
///
/// Video selectors fall back from the preferred container, to any container,
/// to the engine default.
pub fn format_selector(format: MediaFormat, quality: &str) -> String {
    let best = quality == "best";
    match format {
        MediaFormat::AudioOnly => "bestaudio/best".to_string(),
        MediaFormat::VideoOnly if best => "bestvideo[ext=mp4]/bestvideo".to_string(),
        MediaFormat::VideoOnly => format!(
            "bestvideo[height<={q}][ext=mp4]/bestvideo[height<={q}]/bestvideo",
            q = quality
        ),
        MediaFormat::VideoAudio if best => {
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best".to_string()
        }
        MediaFormat::VideoAudio => format!(
            "bestvideo[height<={q}][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<={q}]+bestaudio/best",
            q = quality
        ),
    }
}

/// Output template: `<dir>/%(title)s.%(ext)s`
pub fn output_template(options: &DownloadOptions) -> String {
    options
        .target_directory
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .into_owned()
}

/// Full argument list for downloading a single URL
pub fn download_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        format_selector(options.format, &options.quality),
    ];

    match options.format {
        MediaFormat::AudioOnly => {
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push(AUDIO_CODEC.to_string());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", options.quality));
        }
        MediaFormat::VideoAudio => {
            args.push("--merge-output-format".to_string());
            args.push(VIDEO_CONTAINER.to_string());
        }
        MediaFormat::VideoOnly => {}
    }

    let output = output_template(options);
    args.extend(
        [
            "-o",
            output.as_str(),
            "--no-playlist",
            "--no-warnings",
            "--newline",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--",
            url,
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// Argument list for a metadata lookup; playlist entries are listed flat
pub fn metadata_args(url: &str) -> Vec<String> {
    ["--dump-single-json", "--flat-playlist", "--no-warnings", "--", url]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
