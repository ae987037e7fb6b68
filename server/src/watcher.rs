//! Polling file watcher: walks the document tree on a fixed interval and
//! diffs against a `seen` set, rather than subscribing to OS-level
//! filesystem events. Newly discovered paths are handed to the indexer;
//! paths already seen are silent no-ops.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::document;

/// Polls a directory tree and reports paths not previously seen.
pub struct FileWatcher {
    root: PathBuf,
    interval: Duration,
    seen: Mutex<HashSet<PathBuf>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FileWatcher {
    pub fn new(root: PathBuf, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            root,
            interval,
            seen: Mutex::new(HashSet::new()),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    /// Mark the paths discovered during bootstrap as already seen, so the
    /// first poll after `start` only reports genuinely new arrivals.
    pub fn prime(&self, paths: &[PathBuf]) {
        self.seen.lock().extend(paths.iter().cloned());
    }

    /// Idempotent: calling `start` while already running is a no-op.
    pub fn start<F>(self: &Arc<Self>, on_new: F)
    where
        F: Fn(Vec<PathBuf>) + Send + 'static,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let this = Arc::clone(self);
        let running = Arc::clone(&self.running);
        let handle = std::thread::Builder::new()
            .name("file-watcher".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    std::thread::sleep(this.interval);
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                    let new_paths = this.poll_once();
                    if !new_paths.is_empty() {
                        on_new(new_paths);
                    }
                }
            })
            .expect("failed to spawn file watcher thread");

        *self.handle.lock() = Some(handle);
    }

    /// Idempotent: calling `stop` while already stopped is a no-op.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn poll_once(&self) -> Vec<PathBuf> {
        let mut paths = match document::scan(&self.root) {
            Ok(paths) => paths,
            Err(err) => {
                tracing::warn!(error = %err, "file watcher poll failed");
                return Vec::new();
            }
        };

        // §4.G requires leaf-filename order within a tick, distinct from the
        // bootstrap scan's full-path order — a deliberate redundant sort
        // since `document::scan` already returns full-path order.
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut seen = self.seen.lock();
        let mut new_paths = Vec::new();
        for path in paths {
            if seen.insert(path.clone()) {
                new_paths.push(path);
            }
        }
        new_paths
    }
}
