//! Phrase lookup over the posting store using the shared tokenizer.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::index::PostingStore;
use crate::posting::Posting;
use crate::tokenizer::tokenize;

/// `path -> postings` for every document matching a query.
pub type SearchResults = BTreeMap<String, Vec<Posting>>;

/// Find every document containing the (possibly multi-word) phrase, in
/// order. The reported posting for a match is always the first word's
/// posting, so its `char_offset` is the start of the phrase in the document.
pub fn search_phrase(store: &PostingStore, phrase: &str) -> Result<SearchResults, CoreError> {
    let words: Vec<String> = tokenize(phrase).into_iter().map(|t| t.token).collect();
    if words.is_empty() {
        return Err(CoreError::EmptyQuery);
    }

    let snapshot = store.snapshot();
    let mut results = SearchResults::new();

    let Some(first_word_docs) = snapshot.lookup(&words[0]) else {
        return Ok(results);
    };

    'candidate: for (path, first_postings) in first_word_docs {
        let mut lists: Vec<&Vec<Posting>> = Vec::with_capacity(words.len());
        lists.push(first_postings);

        for word in &words[1..] {
            let Some(word_docs) = snapshot.lookup(word) else {
                continue 'candidate;
            };
            let Some(postings) = word_docs.get(path) else {
                continue 'candidate;
            };
            lists.push(postings);
        }

        let mut matches = Vec::new();
        for candidate in lists[0] {
            let base = candidate.word_offset;
            let is_adjacent_run = lists.iter().enumerate().skip(1).all(|(offset, list)| {
                list.iter().any(|p| p.word_offset == base + offset as u32)
            });
            if is_adjacent_run {
                matches.push(*candidate);
            }
        }

        if !matches.is_empty() {
            results.insert(path.clone(), matches);
        }
    }

    Ok(results)
}

/// Single-word search, equivalent to [`search_phrase`] with exactly one word.
pub fn search_word(store: &PostingStore, word: &str) -> Result<SearchResults, CoreError> {
    search_phrase(store, word)
}
