// tests/supervisor_debounce.rs

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{advance_ms, settle, Harness, DEBOUNCE};
use packwatch_test_utils::fake_executor::RecordingExecutor;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn burst_of_changes_yields_one_rebuild_after_quiet_period() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png"]);
    let handle = h.start("/proj/a.tps");

    assert_eq!(h.watcher.touch("/proj/src/x.png"), 1);
    settle().await;
    advance_ms(100).await;

    assert_eq!(h.watcher.touch("/proj/src/y.png"), 1);
    let last_change = Instant::now();
    settle().await;

    advance_ms(999).await;
    assert_eq!(h.executor.call_count(), 0, "rebuild fired before the debounce elapsed");

    advance_ms(1).await;
    let calls = h.executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].descriptor, PathBuf::from("/proj/a.tps"));
    assert_eq!(calls[0].started_at - last_change, DEBOUNCE);

    // Nothing else is owed.
    advance_ms(5_000).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn many_rapid_changes_collapse_into_one_rebuild() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["src"]);
    let handle = h.start("/proj/a.tps");

    for _ in 0..20 {
        h.watcher.touch("/proj/src/sprite.png");
        settle().await;
        advance_ms(50).await;
    }

    advance_ms(2_000).await;
    assert_eq!(h.executor.call_count(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn change_during_rebuild_runs_exactly_one_follow_up() {
    let h = Harness::new(RecordingExecutor::taking(Duration::from_secs(5)));
    h.write_descriptor("/proj/a.tps", ["src/x.png", "src/y.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_000).await;
    assert_eq!(h.executor.running(), 1);

    // Several changes while the first rebuild is still going.
    h.watcher.touch("/proj/src/y.png");
    settle().await;
    advance_ms(100).await;
    h.watcher.touch("/proj/src/x.png");
    settle().await;

    advance_ms(20_000).await;

    let calls = h.executor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(h.executor.max_concurrent(), 1);

    // The follow-up starts right when the first one finishes, without
    // another debounce.
    assert_eq!(calls[0].finished_at, Some(calls[1].started_at));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn change_after_rebuild_finishes_is_debounced_again() {
    let h = Harness::new(RecordingExecutor::taking(Duration::from_millis(200)));
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_500).await;
    assert_eq!(h.executor.call_count(), 1);
    assert_eq!(h.executor.running(), 0);

    h.watcher.touch("/proj/src/x.png");
    let changed_at = Instant::now();
    settle().await;
    advance_ms(2_000).await;

    let calls = h.executor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].started_at - changed_at, DEBOUNCE);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_rebuild_does_not_wedge_the_controller() {
    let h = Harness::new(RecordingExecutor::failing());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 1);

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_100).await;
    assert_eq!(h.executor.call_count(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn manual_completion_releases_the_pending_rebuild() {
    let h = Harness::new(RecordingExecutor::manual());
    h.write_descriptor("/proj/a.tps", ["src/x.png"]);
    let handle = h.start("/proj/a.tps");

    h.watcher.touch("/proj/src/x.png");
    settle().await;
    advance_ms(1_000).await;
    assert_eq!(h.executor.call_count(), 1);

    h.watcher.touch("/proj/src/x.png");
    settle().await;

    // However long the rebuild takes, nothing new starts until it is done.
    advance_ms(30_000).await;
    assert_eq!(h.executor.call_count(), 1);

    h.executor.complete_one();
    settle().await;
    assert_eq!(h.executor.call_count(), 2);

    h.executor.complete_one();
    settle().await;
    advance_ms(5_000).await;
    assert_eq!(h.executor.call_count(), 2);
    assert_eq!(h.executor.max_concurrent(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn descriptors_are_debounced_independently() {
    let h = Harness::new(RecordingExecutor::taking(Duration::from_secs(3)));
    h.write_descriptor("/proj/a.tps", ["a/x.png"]);
    h.write_descriptor("/proj/b.tps", ["b/y.png"]);
    let a = h.start("/proj/a.tps");
    let b = h.start("/proj/b.tps");

    h.watcher.touch("/proj/a/x.png");
    settle().await;
    advance_ms(500).await;
    h.watcher.touch("/proj/b/y.png");
    settle().await;

    advance_ms(600).await;
    assert_eq!(h.executor.descriptors(), vec![PathBuf::from("/proj/a.tps")]);

    // b rebuilds on its own schedule even though a is still running.
    advance_ms(500).await;
    assert_eq!(
        h.executor.descriptors(),
        vec![PathBuf::from("/proj/a.tps"), PathBuf::from("/proj/b.tps")]
    );
    assert_eq!(h.executor.max_concurrent(), 2);

    a.stop().await;
    b.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shared_source_rebuilds_every_descriptor_declaring_it() {
    let h = Harness::new(RecordingExecutor::instant());
    h.write_descriptor("/proj/a.tps", ["shared"]);
    h.write_descriptor("/proj/b.tps", ["shared", "only-b"]);
    let a = h.start("/proj/a.tps");
    let b = h.start("/proj/b.tps");

    assert_eq!(h.watcher.touch("/proj/shared/icon.png"), 2);
    settle().await;
    advance_ms(1_100).await;

    let mut rebuilt = h.executor.descriptors();
    rebuilt.sort();
    assert_eq!(
        rebuilt,
        vec![PathBuf::from("/proj/a.tps"), PathBuf::from("/proj/b.tps")]
    );

    a.stop().await;
    b.stop().await;
}
