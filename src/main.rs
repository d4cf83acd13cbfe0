// src/main.rs

use clap::ArgMatches;
use colored::*;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn, LevelFilter};
use notify_rust::Notification as DesktopNotification;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tubeloader::app::AppContext;
use tubeloader::cli::build_cli;
use tubeloader::config::{settings_path, Settings};
use tubeloader::engine::YtDlpEngine;
use tubeloader::error::AppError;
use tubeloader::events::Notification;
use tubeloader::media::{quality_label, validate_quality, MediaFormat, Metadata, ProgressEvent};
use tubeloader::queue::{ItemStatus, QueueItem};
use tubeloader::utils::{
    ensure_download_dir, format_progress_bytes, format_speed, is_dependency_installed, truncate,
};
use tubeloader::worker::{CancelPolicy, PassSummary};
use tubeloader::VERSION;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logger();
    info!("tubeloader starting up - version {}", VERSION);

    let matches = build_cli().get_matches();
    let settings = Settings::load_default()?;
    debug!("Loaded settings: {:?}", settings);

    match matches.subcommand() {
        Some(("info", sub)) => run_info(sub, &settings).await,
        Some(("download", sub)) => run_download(sub, &settings).await,
        Some(("config", sub)) => run_config(sub, &settings),
        _ => Ok(()),
    }
}

async fn run_info(matches: &ArgMatches, settings: &Settings) -> Result<(), AppError> {
    let url = matches.get_one::<String>("url").ok_or("URL is required")?;

    let engine = Arc::new(YtDlpEngine::new(&settings.ytdlp_path));
    let (ctx, mut rx) = AppContext::from_settings(engine, settings);

    let metadata = lookup(&ctx, &mut rx, url).await?;
    print_metadata(&metadata);
    Ok(())
}

async fn run_download(matches: &ArgMatches, settings: &Settings) -> Result<(), AppError> {
    let urls: Vec<String> = matches
        .get_many::<String>("urls")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let format = match matches.get_one::<String>("format") {
        Some(value) => MediaFormat::parse(value)?,
        None => settings.default_format,
    };
    let quality = matches
        .get_one::<String>("quality")
        .cloned()
        .unwrap_or_else(|| settings.default_quality(format).to_string());
    validate_quality(format, &quality)?;

    let output_dir = match matches.get_one::<String>("output-dir") {
        Some(dir) => PathBuf::from(dir),
        None => settings.output_dir.clone(),
    };
    let output_dir = ensure_download_dir(&output_dir)?;

    let policy = if matches.get_flag("skip-cancelled") {
        CancelPolicy::SkipItem
    } else {
        settings.cancel_policy
    };

    if format == MediaFormat::AudioOnly && !is_dependency_installed("ffmpeg").unwrap_or(false) {
        warn!("ffmpeg not found in PATH");
        println!(
            "{}",
            "ffmpeg was not found; audio conversion will likely fail.".yellow()
        );
    }

    let engine = Arc::new(YtDlpEngine::new(&settings.ytdlp_path));
    let (ctx, mut rx) = AppContext::new(engine, output_dir, policy, settings.channel_capacity);

    println!("{}", format!("tubeloader {}", VERSION).bright_cyan().bold());
    println!(
        "{} {} ({}) into {}",
        "Format:".blue(),
        format,
        quality_label(format, &quality),
        ctx.output_dir().display()
    );

    for url in &urls {
        if matches.get_flag("playlist") {
            match lookup(&ctx, &mut rx, url).await {
                Ok(metadata) => {
                    let added = ctx.enqueue_metadata(&metadata, url, format, &quality)?;
                    println!("{} {} ({} item(s))", "Queued".green(), metadata.title, added);
                }
                Err(e) => eprintln!("{} {}: {}", "Skipping".red(), url, e),
            }
        } else if let Err(e) = ctx.enqueue(url, format, &quality) {
            eprintln!("{} {}: {}", "Skipping".red(), url, e);
        }
    }

    if ctx.snapshot().is_empty() {
        return Err(AppError::ValidationError("Nothing to download".to_string()));
    }

    ctx.start();
    let summary = match present_pass(&ctx, &mut rx).await {
        Some(summary) => summary,
        None => return Err(AppError::General("Download pass ended unexpectedly".to_string())),
    };

    print_summary(&summary, &ctx.snapshot());
    notify_desktop(&summary);

    if summary.failed > 0 && !summary.cancelled {
        return Err(AppError::General(format!(
            "{} of {} downloads failed",
            summary.failed,
            summary.total()
        )));
    }
    Ok(())
}

fn run_config(matches: &ArgMatches, settings: &Settings) -> Result<(), AppError> {
    match matches.subcommand() {
        Some(("show", _)) => {
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        Some(("path", _)) => {
            println!("{}", settings_path()?.display());
        }
        _ => {}
    }
    Ok(())
}

/// Run a metadata lookup and wait for its notification
async fn lookup(
    ctx: &AppContext,
    rx: &mut Receiver<Notification>,
    url: &str,
) -> Result<Metadata, AppError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Fetching info for {}", url));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let _ = ctx.fetch_metadata(url);
    let result = loop {
        match rx.recv().await {
            Some(Notification::MetadataReady(metadata)) => break Ok(metadata),
            Some(Notification::MetadataError(message)) => {
                break Err(AppError::MetadataFetch(message))
            }
            Some(_) => continue,
            None => break Err(AppError::General("Notification channel closed".to_string())),
        }
    };

    spinner.finish_and_clear();
    result
}

/// Render notifications until the pass reports its summary.
/// Ctrl-C cancels the current download.
async fn present_pass(ctx: &AppContext, rx: &mut Receiver<Notification>) -> Option<PassSummary> {
    let mut view = PassView::default();
    let mut signals = true;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if signals => match signal {
                Ok(()) => {
                    view.println(format!("{}", "Cancelling current download...".yellow()));
                    ctx.cancel();
                }
                Err(e) => {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    signals = false;
                }
            },
            notification = rx.recv() => match notification {
                Some(Notification::PassFinished(summary)) => {
                    view.clear();
                    return Some(summary);
                }
                Some(notification) => view.handle(notification),
                None => return ctx.wait_idle().await,
            },
        }
    }
}

/// Terminal rendering of a running pass
#[derive(Default)]
struct PassView {
    statuses: HashMap<u64, ItemStatus>,
    bar: Option<ProgressBar>,
    current_title: String,
}

impl PassView {
    fn handle(&mut self, notification: Notification) {
        match notification {
            Notification::QueueChanged(items) => self.queue_changed(&items),
            Notification::Progress { item_id, event, .. } => self.progress(item_id, &event),
            other => debug!("Ignoring notification during pass: {:?}", other),
        }
    }

    fn queue_changed(&mut self, items: &[QueueItem]) {
        let total = items.len();
        for (index, item) in items.iter().enumerate() {
            if self.statuses.get(&item.id) == Some(&item.status) {
                continue;
            }
            self.statuses.insert(item.id, item.status);

            match item.status {
                ItemStatus::Pending => {}
                ItemStatus::Downloading => {
                    self.clear();
                    self.current_title = truncate(&item.title, 40);
                    let bar = new_bar();
                    bar.set_prefix(format!("[{}/{}]", index + 1, total));
                    bar.set_message(self.current_title.clone());
                    self.bar = Some(bar);
                }
                ItemStatus::Done => {
                    self.clear();
                    println!("{} {}", "✓".green(), item.title);
                }
                ItemStatus::Error => {
                    self.clear();
                    let message = item.error_message.as_deref().unwrap_or("unknown error");
                    println!("{} {}: {}", "✗".red(), item.title, message.red());
                }
            }
        }
    }

    fn progress(&mut self, item_id: u64, event: &ProgressEvent) {
        if self.statuses.get(&item_id) != Some(&ItemStatus::Downloading) {
            return;
        }
        let Some(bar) = &self.bar else {
            return;
        };
        if event.total_bytes > 0 {
            bar.set_length(event.total_bytes);
            bar.set_position(event.downloaded_bytes.min(event.total_bytes));
        }
        bar.set_message(format!(
            "{} {} {}",
            self.current_title,
            format_progress_bytes(event.downloaded_bytes, event.total_bytes),
            format_speed(event.speed)
        ));
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn new_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {percent}% {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_metadata(metadata: &Metadata) {
    println!("{} {}", "Title:".blue(), metadata.title.bold());
    println!("{} {}", "Channel:".blue(), metadata.channel);
    if metadata.is_playlist {
        println!("{} {} videos", "Playlist:".blue(), metadata.playlist_count);
        for (i, entry) in metadata.entries.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, entry.title);
        }
    } else {
        println!("{} {}", "Duration:".blue(), metadata.duration_display());
    }
    if let Some(thumbnail) = &metadata.thumbnail {
        println!("{} {}", "Thumbnail:".blue(), thumbnail);
    }
}

fn print_summary(summary: &PassSummary, items: &[QueueItem]) {
    println!();
    let line = format!("Completed: {}/{} downloads", summary.done, summary.total());
    if summary.failed == 0 && summary.not_attempted == 0 {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.yellow().bold());
    }
    if summary.failed > 0 {
        println!("{}", format!("Errors: {}", summary.failed).red());
        for item in items.iter().filter(|item| item.status == ItemStatus::Error) {
            println!(
                "  {} {}",
                item.title,
                item.error_message.as_deref().unwrap_or("").dimmed()
            );
        }
    }
    if summary.not_attempted > 0 {
        println!("{}", format!("Not started: {}", summary.not_attempted).yellow());
    }
}

fn notify_desktop(summary: &PassSummary) {
    let body = format!(
        "{} of {} downloads completed, {} failed.",
        summary.done,
        summary.total(),
        summary.failed
    );
    if let Err(e) = DesktopNotification::new()
        .summary("Downloads finished")
        .body(&body)
        .show()
    {
        debug!("Failed to show notification: {}", e);
    }
}

fn init_logger() {
    let mut builder = Builder::from_default_env();

    // Set the default level based on debug/release mode
    if cfg!(debug_assertions) {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }

    builder.format(|buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            buf,
            "[{} {} {}] {}",
            timestamp,
            record.level().to_string().to_uppercase(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // Allow override through RUST_LOG environment variable
    builder.parse_env("RUST_LOG");
    builder.init();
}
