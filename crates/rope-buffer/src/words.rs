//! Word-boundary scanning ("ctrl+arrow" caret movement).
//!
//! Characters fall into three classes: identifier characters (letters, digits and `_`),
//! whitespace, and everything else. A word is a maximal run of one class. Surrogate pairs are
//! decoded before classification and always stepped over as a whole.

use crate::buffer::{is_high_surrogate, is_low_surrogate};
use crate::rope::Rope;
use std::iter::Peekable;

/// Character class used by the word scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Letters, digits and `_`.
    Identifier,
    /// Any Unicode whitespace, including line breaks.
    Whitespace,
    /// Punctuation, symbols and unpaired surrogates.
    Other,
}

impl CharClass {
    /// Classify a character.
    pub fn of(ch: char) -> Self {
        if ch == '_' || ch.is_alphanumeric() {
            Self::Identifier
        } else if ch.is_whitespace() {
            Self::Whitespace
        } else {
            Self::Other
        }
    }
}

/// Decoded characters with their UTF-16 width, front to back.
fn forward(rope: &Rope, from: usize) -> impl Iterator<Item = (CharClass, usize)> + '_ {
    char::decode_utf16(rope.chars(from..rope.char_count()).map(|c| c.unit)).map(|decoded| {
        match decoded {
            Ok(ch) => (CharClass::of(ch), ch.len_utf16()),
            Err(_) => (CharClass::Other, 1),
        }
    })
}

/// Decoded characters with their UTF-16 width, back to front, ending before `to`.
fn backward(rope: &Rope, to: usize) -> impl Iterator<Item = (CharClass, usize)> + '_ {
    let mut units = rope.chars_rev(0..to).map(|c| c.unit).peekable();
    std::iter::from_fn(move || {
        let unit = units.next()?;
        if is_low_surrogate(unit)
            && let Some(&high) = units.peek()
            && is_high_surrogate(high)
        {
            units.next();
            let ch = char::decode_utf16([high, unit])
                .next()
                .and_then(Result::ok)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Some((CharClass::of(ch), 2));
        }
        let class = char::from_u32(u32::from(unit)).map_or(CharClass::Other, CharClass::of);
        Some((class, 1))
    })
}

/// Advance `pos` over the leading run of `class` in `chars`, leaving the first character of
/// another class unconsumed.
fn skip_run<I>(mut pos: usize, class: CharClass, chars: &mut Peekable<I>) -> usize
where
    I: Iterator<Item = (CharClass, usize)>,
{
    while let Some((_, width)) = chars.next_if(|&(c, _)| c == class) {
        pos += width;
    }
    pos
}

impl Rope {
    /// Move `idx` back to the start of the surrogate pair it splits, if any.
    fn char_start(&self, idx: usize) -> usize {
        if self.splits_pair(idx) {
            idx - 1
        } else {
            idx
        }
    }

    /// Offset where the word after the one containing `idx` starts.
    ///
    /// Scans forward over the run of characters sharing the class of the character at `idx`.
    /// With `skip_whitespaces`, whitespace following that run is skipped as well, which is
    /// where "ctrl+right" lands. Offsets at or past the end return `char_count()`.
    pub fn next_word_start(&self, idx: usize, skip_whitespaces: bool) -> usize {
        let len = self.char_count();
        if idx >= len {
            return len;
        }
        let idx = self.char_start(idx);
        let mut chars = forward(self, idx).peekable();
        let Some(&(class, _)) = chars.peek() else {
            return len;
        };
        let pos = skip_run(idx, class, &mut chars);
        if skip_whitespaces && class != CharClass::Whitespace {
            return skip_run(pos, CharClass::Whitespace, &mut chars);
        }
        pos
    }

    /// Offset where the word ending at `idx` starts ("ctrl+left").
    ///
    /// With `skip_whitespaces`, whitespace right before `idx` is passed over first, so the
    /// caret moves to the start of the previous word instead of the whitespace run.
    pub fn current_word_start(&self, idx: usize, skip_whitespaces: bool) -> usize {
        let idx = self.char_start(idx.min(self.char_count()));
        let mut chars = backward(self, idx).peekable();
        let mut pos = idx;
        if skip_whitespaces {
            while let Some(&(CharClass::Whitespace, width)) = chars.peek() {
                pos -= width;
                chars.next();
            }
        }
        let Some(&(class, _)) = chars.peek() else {
            return pos;
        };
        for (c, width) in chars {
            if c != class {
                break;
            }
            pos -= width;
        }
        pos
    }

    /// First offset at or after `idx` that is not whitespace.
    pub fn skip_whitespaces(&self, idx: usize) -> usize {
        let idx = self.char_start(idx.min(self.char_count()));
        skip_run(idx, CharClass::Whitespace, &mut forward(self, idx).peekable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(CharClass::of('a'), CharClass::Identifier);
        assert_eq!(CharClass::of('7'), CharClass::Identifier);
        assert_eq!(CharClass::of('_'), CharClass::Identifier);
        assert_eq!(CharClass::of('ö'), CharClass::Identifier);
        assert_eq!(CharClass::of('\n'), CharClass::Whitespace);
        assert_eq!(CharClass::of('\t'), CharClass::Whitespace);
        assert_eq!(CharClass::of('!'), CharClass::Other);
    }

    #[test]
    fn test_next_word_start() {
        let rope = Rope::from_text("ab cd");
        assert_eq!(rope.next_word_start(0, false), 2);
        assert_eq!(rope.next_word_start(0, true), 3);
        assert_eq!(rope.next_word_start(2, true), 3);
        assert_eq!(rope.next_word_start(3, true), 5);
        assert_eq!(rope.next_word_start(5, true), 5);
        assert_eq!(rope.next_word_start(99, false), 5);
    }

    #[test]
    fn test_next_word_start_stops_at_punctuation() {
        let rope = Rope::from_text("foo.bar  baz");
        assert_eq!(rope.next_word_start(0, true), 3);
        assert_eq!(rope.next_word_start(3, true), 4);
        assert_eq!(rope.next_word_start(4, true), 9);
        assert_eq!(rope.next_word_start(4, false), 7);
    }

    #[test]
    fn test_current_word_start() {
        let rope = Rope::from_text("ab cd  ef");
        assert_eq!(rope.current_word_start(9, false), 7);
        assert_eq!(rope.current_word_start(7, false), 5);
        assert_eq!(rope.current_word_start(7, true), 3);
        assert_eq!(rope.current_word_start(4, true), 3);
        assert_eq!(rope.current_word_start(0, true), 0);
    }

    #[test]
    fn test_surrogate_pairs_are_one_step() {
        // U+1D400 MATHEMATICAL BOLD CAPITAL A is alphabetic and two units long.
        let rope = Rope::from_text("x\u{1D400}y \u{1F600}\u{1F600}z");
        assert_eq!(rope.next_word_start(0, true), 5);
        assert_eq!(rope.next_word_start(5, false), 9);
        assert_eq!(rope.current_word_start(4, false), 0);
        assert_eq!(rope.current_word_start(9, false), 5);
    }

    #[test]
    fn test_offsets_inside_a_pair_start_at_the_pair() {
        let rope = Rope::from_text("\u{1F600}");
        assert_eq!(rope.current_word_start(1, false), 0);
        assert_eq!(rope.current_word_start(1, true), 0);
        assert_eq!(rope.next_word_start(1, false), 2);

        let rope = Rope::from_text("\u{1F600}a b");
        assert_eq!(rope.next_word_start(1, false), 2);
        assert_eq!(rope.next_word_start(1, true), 2);

        // a, two emoji, space, b
        let rope = Rope::from_text("a\u{1F600}\u{1F600} b");
        assert_eq!(rope.current_word_start(4, false), 1);
        assert_eq!(rope.current_word_start(2, true), 0);
        assert_eq!(rope.next_word_start(2, true), 6);
        assert_eq!(rope.skip_whitespaces(4), 3);
    }

    #[test]
    fn test_skip_whitespaces() {
        let rope = Rope::from_text("a \t\n b");
        assert_eq!(rope.skip_whitespaces(1), 5);
        assert_eq!(rope.skip_whitespaces(0), 0);
        assert_eq!(rope.skip_whitespaces(6), 6);
    }
}
