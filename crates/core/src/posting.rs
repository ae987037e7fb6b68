/// One occurrence of a token inside a document.
///
/// `char_offset` is the byte offset of the token's first byte within the
/// document; `word_offset` is the token's 0-based rank among all tokens
/// emitted for that document. Both increase monotonically in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Posting {
    pub char_offset: u32,
    pub word_offset: u32,
}

impl Posting {
    pub fn new(char_offset: u32, word_offset: u32) -> Self {
        Self { char_offset, word_offset }
    }
}
