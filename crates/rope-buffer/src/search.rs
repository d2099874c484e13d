//! Text search over a [`Rope`].
//!
//! Queries run over the decoded document text with the `regex` crate. All public inputs and
//! outputs are **UTF-16 code unit offsets**, the same coordinates every other rope operation
//! uses. Supported modes:
//!
//! - plain substring search (escaped and compiled into a regex)
//! - regex search
//! - optional whole-word matching
//!
//! For a plain, case-sensitive scan without building the document string, see
//! [`Rope::find_all`].

use crate::rope::Rope;
use crate::words::CharClass;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (letters, digits and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// A match returned by the search APIs, expressed as a half-open code unit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl SearchMatch {
    /// Returns the length of the match in code units.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// The document decoded to UTF-8 plus a byte offset ↔ UTF-16 offset table.
///
/// Unpaired surrogates decode to U+FFFD, which is one code unit wide like the surrogate it
/// replaces, so offsets stay aligned with the rope.
#[derive(Debug)]
struct Utf16Index {
    text: String,
    /// `(byte offset, code unit offset)` of every char, plus the end of the text.
    offsets: Vec<(usize, usize)>,
}

impl Utf16Index {
    fn new(rope: &Rope) -> Self {
        let mut text = String::with_capacity(rope.char_count());
        let mut offsets = Vec::with_capacity(rope.char_count() + 1);
        let mut unit = 0;
        for ch in rope.decoded_chars(0..rope.char_count()) {
            offsets.push((text.len(), unit));
            text.push(ch);
            unit += ch.len_utf16();
        }
        offsets.push((text.len(), unit));
        Self { text, offsets }
    }

    fn unit_len(&self) -> usize {
        self.offsets.last().map_or(0, |&(_, unit)| unit)
    }

    fn unit_to_byte(&self, unit: usize) -> usize {
        let idx = self.offsets.partition_point(|&(_, u)| u < unit);
        self.offsets
            .get(idx)
            .map_or(self.text.len(), |&(byte, _)| byte)
    }

    fn byte_to_unit(&self, byte: usize) -> usize {
        let idx = self.offsets.partition_point(|&(b, _)| b < byte);
        self.offsets
            .get(idx)
            .map_or(self.unit_len(), |&(_, unit)| unit)
    }

    fn char_before(&self, byte: usize) -> Option<char> {
        self.text.get(..byte)?.chars().next_back()
    }

    fn char_after(&self, byte: usize) -> Option<char> {
        self.text.get(byte..)?.chars().next()
    }

    fn to_match(&self, m: regex::Match<'_>) -> SearchMatch {
        SearchMatch {
            start: self.byte_to_unit(m.start()),
            end: self.byte_to_unit(m.end()),
        }
    }
}

fn compile_search_regex(query: &str, options: SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()?)
}

fn is_word_char(ch: char) -> bool {
    CharClass::of(ch) == CharClass::Identifier
}

fn is_whole_word(index: &Utf16Index, m: regex::Match<'_>) -> bool {
    !index.char_before(m.start()).is_some_and(is_word_char)
        && !index.char_after(m.end()).is_some_and(is_word_char)
}

/// Find the next occurrence of `query`, searching forward from offset `from`.
///
/// - Returns `Ok(None)` if no match is found (or if `query` is empty).
/// - Empty regex matches are skipped.
pub fn find_next(
    rope: &Rope,
    query: &str,
    options: SearchOptions,
    from: usize,
) -> Result<Option<SearchMatch>, SearchError> {
    if query.is_empty() {
        return Ok(None);
    }

    let re = compile_search_regex(query, options)?;
    let index = Utf16Index::new(rope);

    let mut start_byte = index.unit_to_byte(from.min(index.unit_len()));
    while start_byte <= index.text.len() {
        let Some(m) = re.find_at(&index.text, start_byte) else {
            return Ok(None);
        };
        if m.is_empty() {
            let Some(ch) = index.char_after(m.end()) else {
                return Ok(None);
            };
            start_byte = m.end() + ch.len_utf8();
            continue;
        }
        if options.whole_word && !is_whole_word(&index, m) {
            start_byte = m.end();
            continue;
        }
        return Ok(Some(index.to_match(m)));
    }
    Ok(None)
}

/// Find the previous occurrence of `query` that ends at or before offset `from`.
///
/// - Returns `Ok(None)` if no match is found (or if `query` is empty).
pub fn find_prev(
    rope: &Rope,
    query: &str,
    options: SearchOptions,
    from: usize,
) -> Result<Option<SearchMatch>, SearchError> {
    if query.is_empty() {
        return Ok(None);
    }

    let re = compile_search_regex(query, options)?;
    let index = Utf16Index::new(rope);
    let limit = index.unit_to_byte(from.min(index.unit_len()));

    let last = re
        .find_iter(&index.text[..limit])
        .filter(|m| !m.is_empty())
        .filter(|m| !options.whole_word || is_whole_word(&index, *m))
        .last();
    Ok(last.map(|m| index.to_match(m)))
}

/// Find all non-overlapping occurrences of `query`.
///
/// - Returns an empty list if `query` is empty.
pub fn find_all(
    rope: &Rope,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, SearchError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let re = compile_search_regex(query, options)?;
    let index = Utf16Index::new(rope);

    Ok(re
        .find_iter(&index.text)
        .filter(|m| !m.is_empty())
        .filter(|m| !options.whole_word || is_whole_word(&index, *m))
        .map(|m| index.to_match(m))
        .collect())
}
