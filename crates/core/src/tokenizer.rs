//! Lexer shared by documents and query phrases, so lookups stay symmetric.

/// A single lexed token plus its position within the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOccurrence {
    pub token: String,
    pub char_offset: u32,
    pub word_offset: u32,
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn lower_ascii(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b + (b'a' - b'A')
    } else {
        b
    }
}

/// Lex `text` into maximal runs of ASCII alphanumeric/underscore bytes,
/// lowercasing each emitted token. Non-ASCII bytes (including UTF-8
/// continuation bytes) are never token bytes, so multibyte characters act as
/// separators rather than corrupting a token.
pub fn tokenize(text: &str) -> Vec<TokenOccurrence> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut start = 0usize;
    let mut word_offset = 0u32;

    for (i, &b) in bytes.iter().enumerate() {
        if is_token_byte(b) {
            if current.is_empty() {
                start = i;
            }
            current.push(lower_ascii(b));
        } else if !current.is_empty() {
            tokens.push(finish_token(&mut current, start, word_offset));
            word_offset += 1;
        }
    }
    if !current.is_empty() {
        tokens.push(finish_token(&mut current, start, word_offset));
    }

    tokens
}

fn finish_token(current: &mut Vec<u8>, start: usize, word_offset: u32) -> TokenOccurrence {
    let bytes = std::mem::take(current);
    let token = String::from_utf8(bytes)
        .expect("token bytes are restricted to ASCII alphanumeric/underscore");
    TokenOccurrence { token, char_offset: start as u32, word_offset }
}
