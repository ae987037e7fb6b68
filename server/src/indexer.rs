//! Indexer state machine: coalesces bursts of newly discovered documents
//! into merge passes against the core posting store, tracked by the
//! `running` / `ready` flags described for the indexing collaborator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use phrasedex_core::{tokenize, Document, PartialIndex, Posting, PostingStore};

use crate::document::{self, DocIdAllocator};
use crate::pool::WorkerPool;

/// Drives tokenization and index publication from documents discovered by
/// bootstrap and the file watcher.
///
/// A pass that discovers new work while already indexing does not queue a
/// second pass; the running pass re-checks `pending` before giving up
/// `running`, so any burst of arrivals during a pass is coalesced into one
/// extra loop rather than a queued duplicate (mirrors the original
/// `GetNewFiles` / `UpdateIndex` recursive retry, done here as a loop to
/// keep stack use flat).
pub struct Indexer {
    store: Arc<PostingStore>,
    ids: Arc<DocIdAllocator>,
    pool: Arc<WorkerPool>,
    pending: Mutex<Vec<PathBuf>>,
    running: AtomicBool,
    ready: AtomicBool,
}

impl Indexer {
    pub fn new(store: Arc<PostingStore>, ids: Arc<DocIdAllocator>, pool: Arc<WorkerPool>) -> Arc<Self> {
        Arc::new(Self {
            store,
            ids,
            pool,
            pending: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        })
    }

    /// Record newly discovered paths and kick off a pass if one is not
    /// already running. Safe to call from the watcher thread or bootstrap.
    ///
    /// Called with an empty `paths` at bootstrap when `data_dir` has no
    /// documents yet — that still has to run a (trivial) pass, since it is
    /// the only thing that ever flips `ready` to `true`; without it, search
    /// on an empty corpus would report `in process` forever instead of the
    /// `OK 0` the wire protocol promises once the first pass completes.
    pub fn enqueue(self: &Arc<Self>, mut paths: Vec<PathBuf>) {
        self.pending.lock().append(&mut paths);

        if self.running.swap(true, Ordering::AcqRel) {
            // A pass is already in flight; it will notice this batch itself
            // once it re-checks `pending` before giving up `running`.
            return;
        }

        let this = Arc::clone(self);
        std::thread::Builder::new()
            .name("indexer-driver".into())
            .spawn(move || this.run_passes())
            .expect("failed to spawn indexer driver thread");
    }

    /// True once at least one indexing pass has published a snapshot.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The underlying posting store, for queries to read directly.
    pub fn store(&self) -> &PostingStore {
        &self.store
    }

    /// Drives merge passes from its own dedicated thread — never a job
    /// submitted to `pool` itself, since this loop blocks on futures *from*
    /// that pool and would deadlock a small pool against its own driver.
    fn run_passes(self: Arc<Self>) {
        loop {
            let batch = std::mem::take(&mut *self.pending.lock());
            if !batch.is_empty() {
                self.index_batch(batch);
            }
            // A pass has completed, even an empty one over a zero-document
            // corpus: that is what the wire protocol's `ready` gate is
            // actually asking about ("has the first pass finished"), not
            // "did the first pass find anything".
            self.ready.store(true, Ordering::Release);

            self.running.store(false, Ordering::Release);

            // A burst that arrived while we were indexing may have been
            // appended to `pending` after our take() above but before we
            // cleared `running`; enqueue() would have seen `running == true`
            // and left without scheduling a pass, so we must reclaim it.
            if self.pending.lock().is_empty() {
                return;
            }
            if self.running.swap(true, Ordering::AcqRel) {
                // Another call beat us to reclaiming it.
                return;
            }
        }
    }

    /// Load the batch, fan one tokenization job per document out to the
    /// worker pool, then merge each job's partial index into the store in
    /// submission order as its future resolves.
    fn index_batch(&self, paths: Vec<PathBuf>) {
        let start = std::time::Instant::now();
        let docs = document::load(&paths, &self.ids);
        let doc_count = docs.len();

        let handles: Vec<_> = docs
            .into_iter()
            .filter_map(|doc| match self.pool.submit(move || tokenize_document(doc)) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    tracing::warn!(error = %err, "could not submit tokenization job");
                    None
                }
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(partial) => self.store.publish(partial),
                Err(err) => tracing::warn!(error = %err, "tokenization job result lost"),
            }
        }

        tracing::info!(docs = doc_count, elapsed_ms = start.elapsed().as_millis() as u64, "indexed batch");
    }

    /// Diagnostic dump, forwarded to the posting store.
    pub fn show(&self) {
        tracing::info!(
            ready = self.is_ready(),
            pending = self.pending.lock().len(),
            "indexer state"
        );
        self.store.show();
    }
}

/// One worker-pool job: tokenize a single document into its partial index.
/// Runs on a worker thread, entirely independent of any other document's job.
fn tokenize_document(doc: Document) -> PartialIndex {
    let mut partial: PartialIndex = HashMap::new();
    for occurrence in tokenize(&doc.content) {
        partial
            .entry(occurrence.token)
            .or_default()
            .entry(doc.path.clone())
            .or_default()
            .push(Posting::new(occurrence.char_offset, occurrence.word_offset));
    }
    partial
}
