//! The inverted index: concurrent construction, snapshot reads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::posting::Posting;

/// The posting subset produced by tokenizing exactly one document:
/// `word -> path -> postings`. Indexing jobs build one of these per document
/// and hand it to [`PostingStore::publish`].
pub type PartialIndex = HashMap<String, HashMap<String, Vec<Posting>>>;

type IndexData = HashMap<String, HashMap<String, Vec<Posting>>>;

/// An immutable, point-in-time view of the posting store.
///
/// Holding a snapshot never blocks a concurrent `publish`, and a query that
/// performs several lookups against one snapshot is guaranteed to see a
/// single generation of the index throughout.
#[derive(Clone)]
pub struct IndexSnapshot(Arc<IndexData>);

impl IndexSnapshot {
    /// Postings for `word`, keyed by document path, or `None` if the word
    /// has never been indexed in this generation.
    pub fn lookup(&self, word: &str) -> Option<&HashMap<String, Vec<Posting>>> {
        self.0.get(word)
    }

    pub fn word_count(&self) -> usize {
        self.0.len()
    }
}

/// Concurrent, append-only inverted index.
///
/// Publishers take an exclusive lock across the merge; readers acquire a
/// shared handle to the currently-published generation under the same lock
/// and release it immediately, so a snapshot is cheap to take even while a
/// merge is in flight on another thread.
pub struct PostingStore {
    inner: Mutex<Arc<IndexData>>,
}

impl PostingStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Arc::new(HashMap::new())) }
    }

    /// Atomically merge a per-document partial index into the global store.
    /// A path is expected to be published at most once per word (exactly-once
    /// indexing, enforced by the caller) so this always appends, never
    /// overwrites, a `(word, path)` posting list.
    pub fn publish(&self, partial: PartialIndex) {
        if partial.is_empty() {
            return;
        }
        let mut guard = self.inner.lock();
        let mut next: IndexData = (**guard).clone();
        for (word, docs) in partial {
            let word_entry = next.entry(word).or_default();
            for (path, mut postings) in docs {
                word_entry.entry(path).or_default().append(&mut postings);
            }
        }
        *guard = Arc::new(next);
    }

    /// Take a read handle to the currently-published generation.
    pub fn snapshot(&self) -> IndexSnapshot {
        let guard = self.inner.lock();
        IndexSnapshot(Arc::clone(&guard))
    }

    /// Diagnostic dump of the whole index through the logging facade. Never
    /// called on the hot path — only from an operator-triggered hook.
    pub fn show(&self) {
        let snapshot = self.snapshot();
        for (word, docs) in snapshot.0.iter() {
            tracing::info!(word = word.as_str(), documents = docs.len(), "index entry");
            for (path, postings) in docs {
                tracing::debug!(
                    word = word.as_str(),
                    path = path.as_str(),
                    postings = ?postings,
                    "posting list"
                );
            }
        }
    }
}

impl Default for PostingStore {
    fn default() -> Self {
        Self::new()
    }
}
