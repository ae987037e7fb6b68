//! Directory scan, UTF-8 document loading, and monotonic `doc_id` assignment.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use ignore::WalkBuilder;
use phrasedex_core::Document;

use crate::error::ServerError;

/// Assigns `doc_id`s from a single counter shared by the bootstrap scan and
/// every later watcher-triggered batch, so ids never collide across the
/// process lifetime.
pub struct DocIdAllocator(AtomicU32);

impl DocIdAllocator {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DocIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively enumerate every regular file under `root`, without any
/// gitignore-style filtering — every regular file is a candidate document.
/// The bootstrap caller is responsible for sorting the result; this function
/// only guarantees a complete, non-recursive-into-symlink-cycles walk.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>, ServerError> {
    if !root.is_dir() {
        return Err(ServerError::StartupFatal(format!(
            "data_dir {} does not exist or is not a directory",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "directory walk entry skipped");
                continue;
            }
        };
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Read each path as UTF-8 and wrap it in a [`Document`] with a freshly
/// allocated `doc_id`. A path that cannot be opened or decoded is logged and
/// dropped from the returned batch — it never aborts the batch.
pub fn load(paths: &[PathBuf], ids: &DocIdAllocator) -> Vec<Document> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                docs.push(Document::new(ids.next(), path.to_string_lossy().into_owned(), content));
            }
            Err(source) => {
                let err = ServerError::IoTransient { path: path.clone(), source };
                tracing::warn!(error = %err, "skipping unreadable document");
            }
        }
    }
    docs
}
