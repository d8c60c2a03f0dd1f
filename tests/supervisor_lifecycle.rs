// tests/supervisor_lifecycle.rs

mod common;

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::{advance_ms, settle, Harness};
use packwatch::engine::DescriptorSupervisor;
use packwatch::errors::PackwatchError;
use packwatch::watch_descriptors;
use packwatch_test_utils::fake_executor::RecordingExecutor;

#[tokio::test(start_paused = true)]
async fn start_watches_descriptor_and_every_declared_path() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png", "../shared"]);
    let handle = h.start("/proj/a.tps");

    assert_eq!(handle.descriptor(), Path::new("/proj/a.tps"));
    assert_eq!(
        h.watcher.active_paths(),
        vec![
            PathBuf::from("/proj/a.tps"),
            PathBuf::from("/proj/src/x.png"),
            PathBuf::from("/proj/src/y.png"),
            PathBuf::from("/shared"),
        ]
    );

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_declared_paths_are_watched_once() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "./src/x.png", "src/x.png"]);
    let handle = h.start("/proj/a.tps");

    assert_eq!(h.watcher.installed_count(), 2);
    assert_eq!(h.watcher.touch("/proj/src/x.png"), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn editing_descriptor_drops_removed_paths() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png"]);
    let handle = h.start("/proj/a.tps");

    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    assert_eq!(h.watcher.touch("/proj/a.tps"), 1);
    settle().await;

    // Editing the descriptor is not itself a rebuild trigger.
    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 0);

    assert!(!h.watcher.is_watched("/proj/src/y.png"));
    assert_eq!(h.watcher.touch("/proj/src/y.png"), 0);
    settle().await;
    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 0);

    assert_eq!(h.watcher.touch("/proj/src/x.png"), 1);
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn editing_descriptor_keeps_unchanged_watches_and_adds_new_ones() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");
    assert_eq!(h.watcher.installed_count(), 2);

    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/z.png"]);
    h.watcher.touch("/proj/a.tps");
    settle().await;

    // New descriptor watch and one for z.png; x.png keeps its watch.
    assert_eq!(h.watcher.installed_count(), 4);
    assert!(h.watcher.is_watched("/proj/src/z.png"));

    h.watcher.touch("/proj/src/z.png");
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stale_delivery_from_released_watch_is_ignored() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png"]);
    let handle = h.start("/proj/a.tps");

    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    h.watcher.touch("/proj/a.tps");
    settle().await;

    // A notification queued before y.png's watch was released, plus one from
    // the descriptor watch that was replaced.
    assert_eq!(h.watcher.deliver_stale("/proj/src/y.png"), 1);
    assert_eq!(h.watcher.deliver_stale("/proj/a.tps"), 1);
    settle().await;
    advance_ms(2_000).await;

    assert_eq!(h.executor.call_count(), 0);
    assert_eq!(h.watcher.installed_count(), 4);
    assert!(!handle.is_finished());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn deleting_descriptor_tears_everything_down() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.fs.remove_file("/proj/a.tps");
    h.watcher.touch("/proj/a.tps");
    settle().await;

    assert!(h.watcher.active_paths().is_empty());
    assert_eq!(h.watcher.touch("/proj/src/x.png"), 0);

    // A leftover delivery changes nothing either.
    h.watcher.deliver_stale("/proj/src/x.png");
    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 0);

    packwatch_test_utils::with_timeout(handle.finished()).await;
}

#[tokio::test(start_paused = true)]
async fn deleting_descriptor_cancels_pending_rebuild() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(500).await;

    h.fs.remove_file("/proj/a.tps");
    h.watcher.touch("/proj/a.tps");
    settle().await;

    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 0);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn in_flight_rebuild_finishes_after_teardown_without_effect() {
    let h = Harness::new(RecordingExecutor::taking(Duration::from_secs(5)));
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_000).await;
    assert_eq!(h.executor.running(), 1);

    // Queue a follow-up, then delete the descriptor mid-rebuild.
    h.watcher.touch("/proj/src/x.png");
    settle().await;
    h.fs.remove_file("/proj/a.tps");
    h.watcher.touch("/proj/a.tps");
    settle().await;
    assert!(handle.is_finished());

    // The running rebuild is not cancelled, and its completion starts nothing.
    advance_ms(10_000).await;
    let calls = h.executor.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].finished_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn invalid_edit_keeps_only_descriptor_watch_until_fixed() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.fs.add_file("/proj/a.tps", "<data version=\"1.0\"><struct");
    h.watcher.touch("/proj/a.tps");
    settle().await;

    assert_eq!(h.watcher.active_paths(), vec![PathBuf::from("/proj/a.tps")]);
    assert_eq!(h.watcher.touch("/proj/src/x.png"), 0);
    assert!(!handle.is_finished());

    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    h.watcher.touch("/proj/a.tps");
    settle().await;

    assert!(h.watcher.is_watched("/proj/src/x.png"));
    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failing_to_rewatch_descriptor_tears_down() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.fail_on("/proj/a.tps");
    h.watcher.touch("/proj/a.tps");
    settle().await;

    assert!(h.watcher.active_paths().is_empty());
    packwatch_test_utils::with_timeout(handle.finished()).await;
}

#[tokio::test(start_paused = true)]
async fn unwatchable_source_is_skipped() {
    let h = Harness::new(RecordingExecutor::instant());
    h.watcher.fail_on("/proj/missing");
    h.write_descriptor("/proj/a.tps", ["missing", "src/x.png"]);
    let handle = h.start("/proj/a.tps");

    assert_eq!(
        h.watcher.active_paths(),
        vec![PathBuf::from("/proj/a.tps"), PathBuf::from("/proj/src/x.png")]
    );

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn invalid_descriptor_does_not_start() {
    let h = Harness::new(RecordingExecutor::instant());
    h.fs.add_file("/proj/bad.tps", "<plist/>");

    let err = DescriptorSupervisor::start(Path::new("/proj/bad.tps"), h.deps()).unwrap_err();
    match err {
        PackwatchError::Schema(msg) => assert!(msg.contains("/proj/bad.tps"), "message was: {msg}"),
        other => panic!("Expected Schema error, got: {other:?}"),
    }
    assert_eq!(h.watcher.installed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn watch_descriptors_skips_the_ones_that_fail() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["a.png"]);
    h.fs.add_file("/proj/broken.tps", "<data version=\"1.0\">");
    h.write_descriptor("/proj/c.tps", ["c.png"]);

    let handles = watch_descriptors(
        &[
            PathBuf::from("/proj/a.tps"),
            PathBuf::from("/proj/broken.tps"),
            PathBuf::from("/proj/c.tps"),
        ],
        h.deps(),
    );

    let started: Vec<_> = handles.iter().map(|h| h.descriptor().to_path_buf()).collect();
    assert_eq!(
        started,
        vec![PathBuf::from("/proj/a.tps"), PathBuf::from("/proj/c.tps")]
    );

    for handle in handles {
        handle.stop().await;
    }
}

#[tokio::test(start_paused = true)]
async fn stop_releases_all_watches() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;

    packwatch_test_utils::with_timeout(handle.stop()).await;

    assert!(h.watcher.active_paths().is_empty());
    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 0);
}
