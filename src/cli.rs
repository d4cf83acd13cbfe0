// src/cli.rs

use clap::{Arg, ArgAction, Command};

/// Quality keys accepted on the command line, video and audio together.
/// The pairing with the chosen format is checked when the item is queued.
const QUALITY_VALUES: [&str; 8] = ["best", "1080", "720", "480", "360", "320", "192", "128"];

const FORMAT_VALUES: [&str; 3] = ["video_audio", "video_only", "audio_only"];

/// Build the command-line interface for the application
pub fn build_cli() -> Command {
    Command::new("tubeloader")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ibrahim Mohamed")
        .about("Queue-based video and audio downloader powered by yt-dlp")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("info")
                .about("Show title, channel and duration of a video or playlist")
                .arg(
                    Arg::new("url")
                        .help("The URL of the video or playlist")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("Queue one or more URLs and download them in order")
                .arg(
                    Arg::new("urls")
                        .help("URLs of the videos or playlists to download")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("What to keep: video_audio, video_only or audio_only")
                        .value_parser(FORMAT_VALUES),
                )
                .arg(
                    Arg::new("quality")
                        .long("quality")
                        .short('q')
                        .help("Video height (best, 1080, 720, 480, 360) or audio bitrate (320, 192, 128)")
                        .value_parser(QUALITY_VALUES),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .short('o')
                        .help("Specify custom output directory")
                        .value_name("DIRECTORY"),
                )
                .arg(
                    Arg::new("playlist")
                        .long("playlist")
                        .short('p')
                        .help("Look up each URL first and queue every playlist entry")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("skip-cancelled")
                        .long("skip-cancelled")
                        .help("On Ctrl-C skip only the current item instead of stopping")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect settings")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the effective settings"))
                .subcommand(Command::new("path").about("Print the settings file location")),
        )
}
