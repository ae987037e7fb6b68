//! Tokenizer, inverted index, and phrase query engine for phrasedex.
//!
//! This crate has no knowledge of the network or the filesystem: it is the
//! pure indexing/query core that the `phrasedex-server` binary drives.

pub mod document;
pub mod error;
pub mod index;
pub mod posting;
pub mod query;
pub mod tokenizer;

pub use document::Document;
pub use error::CoreError;
pub use index::{IndexSnapshot, PartialIndex, PostingStore};
pub use posting::Posting;
pub use query::{search_phrase, search_word, SearchResults};
pub use tokenizer::{tokenize, TokenOccurrence};
