/// A single text document known to the index.
///
/// `path` is the document's unique key — it is also the key used inside the
/// posting store, so two documents must never share a `path`. `content` is
/// only needed for the duration of tokenization; callers are free to drop it
/// once a [`crate::index::PartialIndex`] has been produced for this document.
#[derive(Debug, Clone)]
pub struct Document {
    pub doc_id: u32,
    pub path: String,
    pub content: String,
}

impl Document {
    pub fn new(doc_id: u32, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { doc_id, path: path.into(), content: content.into() }
    }
}
