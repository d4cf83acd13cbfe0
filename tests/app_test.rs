// tests/app_test.rs
// Command surface of the application context

mod common;

use common::{context, video, wait_for, MockEngine};
use std::path::PathBuf;
use tubeloader::error::AppError;
use tubeloader::events::Notification;
use tubeloader::media::{MediaFormat, Metadata, PlaylistEntry};
use tubeloader::queue::ItemStatus;
use tubeloader::worker::CancelPolicy;

const VIDEO_URL: &str = "https://example.com/watch?v=abc";
const PLAYLIST_URL: &str = "https://example.com/playlist?list=xyz";

fn playlist() -> Metadata {
    Metadata {
        title: "Mix".to_string(),
        channel: "Someone".to_string(),
        duration: 0,
        thumbnail: None,
        url: PLAYLIST_URL.to_string(),
        is_playlist: true,
        entries: vec![
            PlaylistEntry {
                url: Some("https://example.com/watch?v=1".to_string()),
                title: "First".to_string(),
            },
            PlaylistEntry {
                url: None,
                title: "[Private video]".to_string(),
            },
            PlaylistEntry {
                url: Some("https://example.com/watch?v=3".to_string()),
                title: "Third".to_string(),
            },
        ],
        playlist_count: 3,
    }
}

#[tokio::test]
async fn test_fetch_metadata_reports_ready() {
    let engine = MockEngine::new();
    engine.add_metadata(VIDEO_URL, video("Never Gonna Give You Up", VIDEO_URL));
    let (ctx, mut rx) = context(&engine, CancelPolicy::StopPass);

    ctx.fetch_metadata(VIDEO_URL).await.unwrap();

    match rx.recv().await.unwrap() {
        Notification::MetadataReady(metadata) => {
            assert_eq!(metadata.title, "Never Gonna Give You Up");
            assert_eq!(metadata.duration_display(), "3:32");
        }
        other => panic!("unexpected notification {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_metadata_reports_engine_text() {
    let engine = MockEngine::new();
    let (ctx, mut rx) = context(&engine, CancelPolicy::StopPass);

    ctx.fetch_metadata(VIDEO_URL).await.unwrap();

    match rx.recv().await.unwrap() {
        Notification::MetadataError(message) => assert_eq!(message, "ERROR: Video unavailable"),
        other => panic!("unexpected notification {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_metadata_rejects_invalid_url_without_engine() {
    let engine = MockEngine::new();
    let (ctx, mut rx) = context(&engine, CancelPolicy::StopPass);

    ctx.fetch_metadata("not a url").await.unwrap();

    assert!(matches!(
        rx.recv().await.unwrap(),
        Notification::MetadataError(_)
    ));
    assert!(engine.metadata_calls().is_empty());
}

#[tokio::test]
async fn test_enqueue_validates_input() {
    let engine = MockEngine::new();
    let (ctx, _rx) = context(&engine, CancelPolicy::StopPass);

    assert!(matches!(
        ctx.enqueue("ftp://example.com/a", MediaFormat::VideoAudio, "720"),
        Err(AppError::ValidationError(_))
    ));
    // Audio bitrates are not video qualities and the reverse
    assert!(ctx.enqueue(VIDEO_URL, MediaFormat::VideoAudio, "192").is_err());
    assert!(ctx.enqueue(VIDEO_URL, MediaFormat::AudioOnly, "720").is_err());
    assert!(ctx.snapshot().is_empty());

    ctx.enqueue(VIDEO_URL, MediaFormat::AudioOnly, "320").unwrap();
    assert_eq!(ctx.snapshot().len(), 1);
}

#[tokio::test]
async fn test_enqueue_publishes_queue_snapshot() {
    let engine = MockEngine::new();
    let (ctx, mut rx) = context(&engine, CancelPolicy::StopPass);

    let id = ctx
        .enqueue_titled(VIDEO_URL, Some("My Video"), MediaFormat::VideoOnly, "1080")
        .unwrap();

    let notification = wait_for(&mut rx, |n| matches!(n, Notification::QueueChanged(_))).await;
    match notification {
        Notification::QueueChanged(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].id, id);
            assert_eq!(items[0].title, "My Video");
            assert_eq!(items[0].status, ItemStatus::Pending);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_enqueue_metadata_expands_playlists() {
    let engine = MockEngine::new();
    let (ctx, _rx) = context(&engine, CancelPolicy::StopPass);

    let added = ctx
        .enqueue_metadata(&playlist(), PLAYLIST_URL, MediaFormat::AudioOnly, "128")
        .unwrap();
    assert_eq!(added, 2);

    let items = ctx.snapshot();
    assert_eq!(items[0].title, "First");
    assert_eq!(items[0].url, "https://example.com/watch?v=1");
    assert_eq!(items[1].title, "Third");
}

#[tokio::test]
async fn test_enqueue_metadata_single_video_uses_title() {
    let engine = MockEngine::new();
    let (ctx, _rx) = context(&engine, CancelPolicy::StopPass);

    let added = ctx
        .enqueue_metadata(&video("Song", VIDEO_URL), VIDEO_URL, MediaFormat::VideoAudio, "best")
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(ctx.snapshot()[0].title, "Song");
}

#[tokio::test]
async fn test_output_dir_and_policy() {
    let engine = MockEngine::new();
    let (mut ctx, _rx) = context(&engine, CancelPolicy::SkipItem);

    assert_eq!(ctx.cancel_policy(), CancelPolicy::SkipItem);
    assert_eq!(ctx.engine_name(), "mock");

    ctx.set_output_dir(PathBuf::from("/tmp/elsewhere"));
    assert_eq!(ctx.output_dir(), PathBuf::from("/tmp/elsewhere").as_path());
}
