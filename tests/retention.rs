//! Retention sweeps over a real directory

mod common;

use common::{Output, StubExtractor, WATCH_URL, fetcher_with, fetcher_with_config, files_in};
use filetime::FileTime;
use mediafetch::{AcquisitionRequest, Config, TargetFormat};
use std::path::Path;
use std::time::{Duration, SystemTime};

fn backdate(path: &Path, age: Duration) {
    let mtime = FileTime::from_system_time(SystemTime::now() - age);
    filetime::set_file_mtime(path, mtime).unwrap();
}

#[tokio::test]
async fn sweep_removes_only_aged_artifacts() {
    let (fetcher, dir) = fetcher_with(StubExtractor::new("x", Output::Nothing)).await;
    std::fs::write(dir.path().join("old.mp3"), b"old").unwrap();
    std::fs::write(dir.path().join("recent.mp4"), b"recent").unwrap();
    backdate(&dir.path().join("old.mp3"), Duration::from_secs(61 * 60));
    backdate(&dir.path().join("recent.mp4"), Duration::from_secs(30 * 60));

    let report = fetcher.sweep_now().await;

    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, vec!["old.mp3"]);
    assert!(report.failed.is_empty());
    assert_eq!(files_in(dir.path()), vec!["recent.mp4"]);
}

#[tokio::test]
async fn fresh_artifact_survives_sweep() {
    let (fetcher, dir) =
        fetcher_with(StubExtractor::new("Keep Me", Output::Templated("m4a"))).await;

    fetcher
        .acquire(&AcquisitionRequest::new(WATCH_URL, TargetFormat::Audio))
        .await
        .unwrap();
    let report = fetcher.sweep_now().await;

    assert!(report.deleted.is_empty());
    assert_eq!(files_in(dir.path()), vec!["Keep Me.mp3"]);
}

#[tokio::test]
async fn background_sweeper_reclaims_and_stops_on_shutdown() {
    let mut config = Config::default();
    config.retention.sweep_interval = Duration::from_millis(50);
    config.retention.max_age = Duration::from_secs(60);
    let (fetcher, dir) =
        fetcher_with_config(config, StubExtractor::new("x", Output::Nothing)).await;

    std::fs::write(dir.path().join("stale.mp3"), b"stale").unwrap();
    backdate(&dir.path().join("stale.mp3"), Duration::from_secs(3600));

    assert!(fetcher.start_sweeper().await);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while dir.path().join("stale.mp3").exists() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "sweeper did not reclaim the stale artifact"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fetcher.shutdown().await;
    assert!(!fetcher.is_accepting());
}
