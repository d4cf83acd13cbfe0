// tests/cli_test.rs
use tubeloader::cli::build_cli;

#[test]
fn test_cli_basic_structure() {
    let app = build_cli();
    assert_eq!(app.get_name(), "tubeloader");

    let matches = app
        .try_get_matches_from(vec!["tubeloader", "info", "https://example.com/watch?v=1"])
        .unwrap();

    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "info");
    assert_eq!(
        sub.get_one::<String>("url").unwrap(),
        "https://example.com/watch?v=1"
    );
}

#[test]
fn test_cli_requires_subcommand() {
    assert!(build_cli().try_get_matches_from(vec!["tubeloader"]).is_err());
}

#[test]
fn test_download_accepts_several_urls() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "tubeloader",
            "download",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ])
        .unwrap();

    let sub = matches.subcommand_matches("download").unwrap();
    let urls: Vec<&String> = sub.get_many::<String>("urls").unwrap().collect();
    assert_eq!(urls.len(), 3);
    assert_eq!(urls[2], "https://example.com/c");
    assert!(!sub.get_flag("playlist"));
    assert!(!sub.get_flag("skip-cancelled"));
}

#[test]
fn test_download_options() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "tubeloader",
            "download",
            "https://example.com/a",
            "--format",
            "audio_only",
            "-q",
            "320",
            "--output-dir",
            "/tmp/music",
            "--playlist",
            "--skip-cancelled",
        ])
        .unwrap();

    let sub = matches.subcommand_matches("download").unwrap();
    assert_eq!(sub.get_one::<String>("format").unwrap(), "audio_only");
    assert_eq!(sub.get_one::<String>("quality").unwrap(), "320");
    assert_eq!(sub.get_one::<String>("output-dir").unwrap(), "/tmp/music");
    assert!(sub.get_flag("playlist"));
    assert!(sub.get_flag("skip-cancelled"));
}

#[test]
fn test_invalid_option_values() {
    let result = build_cli().try_get_matches_from(vec![
        "tubeloader",
        "download",
        "https://example.com/a",
        "--format",
        "mp4",
    ]);
    assert!(result.is_err());

    let result = build_cli().try_get_matches_from(vec![
        "tubeloader",
        "download",
        "https://example.com/a",
        "--quality",
        "4320",
    ]);
    assert!(result.is_err());

    // A URL is required
    let result = build_cli().try_get_matches_from(vec!["tubeloader", "download"]);
    assert!(result.is_err());
}

#[test]
fn test_config_subcommands() {
    let matches = build_cli()
        .try_get_matches_from(vec!["tubeloader", "config", "path"])
        .unwrap();
    let config = matches.subcommand_matches("config").unwrap();
    assert_eq!(config.subcommand_name(), Some("path"));

    assert!(build_cli()
        .try_get_matches_from(vec!["tubeloader", "config"])
        .is_err());
}
