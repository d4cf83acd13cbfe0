// src/engine/progress.rs
// Machine-readable progress lines printed by yt-dlp

use crate::media::{ProgressEvent, ProgressPhase};

/// Marker at the start of every progress line we ask yt-dlp to print
pub const PROGRESS_MARKER: &str = "tubeloader-progress";

/// Value for `--progress-template`. The filename goes last since it may contain spaces.
pub const PROGRESS_TEMPLATE: &str = "download:tubeloader-progress %(progress.status)s \
%(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s \
%(progress.speed)s %(progress.filename)s";

/// Parse one output line. Returns `None` for anything that is not a progress line
/// or reports a phase other than downloading/finished.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?.trim_start();
    let mut fields = rest.splitn(6, ' ');

    let phase = match fields.next()? {
        "downloading" => ProgressPhase::Downloading,
        "finished" => ProgressPhase::Finished,
        _ => return None,
    };
    let downloaded = parse_number(fields.next()?);
    let total = parse_number(fields.next()?);
    let estimate = parse_number(fields.next()?);
    let speed = parse_number(fields.next()?);
    let filename = fields
        .next()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != "NA")
        .map(str::to_string);

    let total_bytes = total.or(estimate).map(|t| t as u64).unwrap_or(0);
    let mut downloaded_bytes = downloaded.map(|d| d as u64).unwrap_or(0);
    if phase == ProgressPhase::Finished && downloaded_bytes == 0 {
        downloaded_bytes = total_bytes;
    }

    Some(ProgressEvent {
        phase,
        downloaded_bytes,
        total_bytes,
        speed: speed.filter(|s| *s > 0.0),
        filename,
    })
}

/// yt-dlp prints `NA` for missing values and floats for estimates
fn parse_number(field: &str) -> Option<f64> {
    match field.trim() {
        "" | "NA" | "None" => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0),
    }
}
