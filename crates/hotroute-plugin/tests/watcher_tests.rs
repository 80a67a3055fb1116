// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed tests for the plugin watcher.

use std::time::Duration;

use hotroute_plugin::{PluginWatcher, WatchEvent, WatcherConfig};
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

const DEBOUNCE: Duration = Duration::from_millis(200);

async fn next_event(rx: &mut Receiver<WatchEvent>) -> WatchEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for watch event")
        .expect("watch channel closed")
}

fn start(dir: &std::path::Path) -> (Receiver<WatchEvent>, CancellationToken) {
    let (watcher, rx) = PluginWatcher::new(WatcherConfig::new(dir).with_debounce(DEBOUNCE)).unwrap();
    let cancel = CancellationToken::new();
    tokio::spawn(watcher.run(cancel.clone()));
    (rx, cancel)
}

#[tokio::test(flavor = "multi_thread")]
async fn burst_of_writes_collapses_into_one_event() {
    let dir = tempfile::tempdir().unwrap();
    let (mut rx, cancel) = start(dir.path());
    let file = dir.path().join("ping.toml");

    for i in 0..5 {
        std::fs::write(&file, format!("path = \"/ping{i}\"\n")).unwrap();
    }

    assert_eq!(
        next_event(&mut rx).await,
        WatchEvent::PluginChanged {
            file: "ping.toml".to_string()
        }
    );

    let extra = tokio::time::timeout(DEBOUNCE * 3, rx.recv()).await;
    assert!(extra.is_err(), "expected no further events, got {extra:?}");
    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn different_files_have_independent_timers() {
    let dir = tempfile::tempdir().unwrap();
    let (mut rx, cancel) = start(dir.path());

    std::fs::write(dir.path().join("a.toml"), "").unwrap();
    std::fs::write(dir.path().join("b.toml"), "").unwrap();

    let mut files = vec![];
    for _ in 0..2 {
        match next_event(&mut rx).await {
            WatchEvent::PluginChanged { file } => files.push(file),
            other => panic!("unexpected event {other:?}"),
        }
    }
    files.sort();
    assert_eq!(files, vec!["a.toml", "b.toml"]);
    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_file_is_reported_as_removed() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gone.toml");
    std::fs::write(&file, "").unwrap();
    let (mut rx, cancel) = start(dir.path());

    std::fs::remove_file(&file).unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        WatchEvent::PluginRemoved {
            file: "gone.toml".to_string()
        }
    );
    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn subdirectory_and_foreign_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (mut rx, cancel) = start(dir.path());

    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested").join("x.toml"), "").unwrap();
    std::fs::write(dir.path().join("README.md"), "").unwrap();

    let event = tokio::time::timeout(DEBOUNCE * 4, rx.recv()).await;
    assert!(event.is_err(), "expected no events, got {event:?}");
    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let (watcher, mut rx) = PluginWatcher::new(WatcherConfig::new(dir.path())).unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(cancel.clone()));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher did not stop")
        .unwrap();
    assert!(rx.recv().await.is_none());
}
