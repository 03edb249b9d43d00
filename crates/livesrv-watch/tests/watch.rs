//! End-to-end watcher tests against a real directory.

use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use livesrv_watch::{ChangeEvent, ChangeKind, WatchBackend, WatchHandle, WatchOptions, watch};
use pretty_assertions::assert_eq;

const DEADLINE: Duration = Duration::from_secs(10);

fn start(root: &Path, poll: bool) -> (WatchHandle, mpsc::Receiver<ChangeEvent>) {
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    let options = WatchOptions {
        poll,
        poll_interval: Duration::from_millis(100),
        ..WatchOptions::default()
    };
    let handle = watch(root, &options, move |event| {
        let _ = tx.lock().unwrap().send(event);
    })
    .unwrap();
    (handle, rx)
}

/// Wait for the first event whose file name matches `name`.
fn wait_for(rx: &mpsc::Receiver<ChangeEvent>, name: &str) -> Vec<ChangeEvent> {
    let start = Instant::now();
    let mut seen = Vec::new();
    while start.elapsed() < DEADLINE {
        let Ok(event) = rx.recv_timeout(Duration::from_millis(100)) else {
            continue;
        };
        let done = event.path.file_name().is_some_and(|f| f == name);
        seen.push(event);
        if done {
            return seen;
        }
    }
    panic!("no event for {name} within {DEADLINE:?}, saw {seen:?}");
}

#[test]
fn test_poll_watcher_reports_stylesheet() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, rx) = start(dir.path(), true);
    assert_eq!(handle.backend(), WatchBackend::Poll);

    std::fs::write(dir.path().join("style.css"), "body { color: red }").unwrap();

    let seen = wait_for(&rx, "style.css");
    assert_eq!(seen.last().unwrap().kind, ChangeKind::Stylesheet);
}

#[test]
fn test_native_watcher_reports_html_in_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("blog")).unwrap();
    let (_handle, rx) = start(dir.path(), false);

    std::fs::write(dir.path().join("blog").join("post.html"), "<p>hi</p>").unwrap();

    let seen = wait_for(&rx, "post.html");
    assert_eq!(seen.last().unwrap().kind, ChangeKind::Other);
}

#[test]
fn test_hidden_and_noise_paths_are_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("node_modules")).unwrap();
    let (_handle, rx) = start(dir.path(), true);

    std::fs::write(dir.path().join(".secret.css"), "x").unwrap();
    std::fs::write(dir.path().join("node_modules").join("lib.js"), "x").unwrap();
    std::fs::write(dir.path().join("page.html"), "x").unwrap();

    let mut seen = wait_for(&rx, "page.html");
    std::thread::sleep(Duration::from_millis(300));
    seen.extend(rx.try_iter());

    let is_page = |e: &ChangeEvent| e.path.file_name().is_some_and(|f| f == "page.html");
    assert!(seen.iter().all(is_page), "unexpected events: {seen:?}");
}

#[test]
fn test_removal_is_reported_as_other() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("gone.html");
    std::fs::write(&page, "x").unwrap();
    let (_handle, rx) = start(dir.path(), true);

    std::fs::remove_file(&page).unwrap();

    let seen = wait_for(&rx, "gone.html");
    let last = seen.last().unwrap();
    assert_eq!(last.kind, ChangeKind::Other);
    assert_eq!(last.fs_kind, livesrv_watch::FsEventKind::Removed);
}
