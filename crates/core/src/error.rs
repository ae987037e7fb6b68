/// Errors surfaced by the tokenizer/index/query layer.
///
/// This is deliberately small: the bulk of the error taxonomy (startup,
/// per-connection I/O, pool lifecycle) belongs to the server crate, which
/// owns the collaborators that can actually fail that way.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A query phrase tokenized to zero words (e.g. empty or all-punctuation
    /// input). Not fatal: callers should treat this as a zero-match search.
    #[error("query phrase tokenized to zero words")]
    EmptyQuery,
}
