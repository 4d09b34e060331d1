//! Regex span tokenizer for paragraph text.
//!
//! A token is a run of ASCII word characters (`[A-Za-z0-9_]`), hyphens,
//! quotes, brackets or parentheses; a `$` followed by one non-space
//! character; or any other single non-space character. A non-ASCII letter
//! therefore always stands alone, so `café` is `caf` + `é`.
//!
//! Offsets are UTF-16 code units, the unit browser editors and persisted
//! REF documents count in. A character outside the Basic Multilingual Plane
//! (an emoji, say) is still one token but spans two units.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z0-9_\-'"\[\]\(\)]+|\$[\d.\S]|\S"#).expect("token pattern compiles")
});

/// One token of a paragraph: `[start, end)` in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TokenSpan {
    #[must_use]
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Split `text` into token strings.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split `text` into tokens with their UTF-16 offsets.
#[must_use]
pub fn span_tokenize(text: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    // Byte offsets from the regex are converted incrementally; matches are
    // returned in order so the cursor only moves forward.
    let mut byte_cursor = 0usize;
    let mut unit_cursor = 0usize;
    for found in TOKEN_RE.find_iter(text) {
        unit_cursor += utf16_len(&text[byte_cursor..found.start()]);
        let start = unit_cursor;
        unit_cursor += utf16_len(found.as_str());
        byte_cursor = found.end();
        spans.push(TokenSpan::new(start, unit_cursor, found.as_str()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_on_whitespace() {
        let spans = span_tokenize("one two three four");
        let ranges: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, [(0, 3), (4, 7), (8, 13), (14, 18)]);
        assert_eq!(spans[2].text, "three");
    }

    #[test]
    fn punctuation_is_its_own_token() {
        assert_eq!(tokenize("Hello, world!"), ["Hello", ",", "world", "!"]);
    }

    #[test]
    fn keeps_hyphens_quotes_and_brackets_in_words() {
        assert_eq!(
            tokenize(r#"state-of-the-art "quoted" f(x) [1]"#),
            ["state-of-the-art", "\"quoted\"", "f(x)", "[1]"]
        );
    }

    #[test]
    fn dollar_binds_one_following_char() {
        assert_eq!(tokenize("$5 costs"), ["$5", "costs"]);
        assert_eq!(tokenize("$.50"), ["$.", "50"]);
    }

    #[test]
    fn non_ascii_letters_split_words() {
        assert_eq!(tokenize("café naïve"), ["caf", "é", "na", "ï", "ve"]);
        assert_eq!(tokenize("Ελλάδα"), ["Ε", "λ", "λ", "ά", "δ", "α"]);
    }

    #[test]
    fn offsets_are_utf16_code_units() {
        let spans = span_tokenize("café 😀 naïve");
        let got: Vec<_> = spans
            .iter()
            .map(|s| (s.start, s.end, s.text.as_str()))
            .collect();
        assert_eq!(
            got,
            [
                (0, 3, "caf"),
                (3, 4, "é"),
                (5, 7, "😀"),
                (8, 10, "na"),
                (10, 11, "ï"),
                (11, 13, "ve"),
            ]
        );
        assert_eq!(utf16_len("café 😀 naïve"), 13);
    }

    #[test]
    fn empty_and_blank_text_have_no_tokens() {
        assert!(span_tokenize("").is_empty());
        assert!(span_tokenize(" \t\n").is_empty());
    }
}
