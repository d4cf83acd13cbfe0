// src/lib.rs
// Download queue, worker and yt-dlp adapter behind the tubeloader binary

pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod media;
pub mod queue;
pub mod utils;
pub mod worker;

pub use app::AppContext;
pub use error::{AppError, DownloadError};

/// Crate version, shown by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
