//! Lazy traversals over a rope.
//!
//! All iterators walk the tree leaf by leaf and never materialise the text. They are finite and
//! independent: building a new one restarts from its range, an exhausted one stays exhausted.

use crate::buffer::CharWidth;
use crate::node::{NodeId, Tree};
use std::iter::{FusedIterator, Peekable};
use std::ops::Range;

/// A code unit together with its [`CharWidth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RopeChar {
    /// The UTF-16 code unit.
    pub unit: u16,
    /// Width of the character starting at this unit.
    pub width: CharWidth,
}

impl RopeChar {
    /// Classify a code unit.
    pub fn new(unit: u16) -> Self {
        Self {
            unit,
            width: CharWidth::of(unit),
        }
    }
}

/// Leaf slices of a range, front to back (or back to front with [`DoubleEndedIterator`]).
#[derive(Debug, Clone)]
pub struct Leafs<'a> {
    tree: &'a Tree,
    front: Option<(NodeId, usize)>,
    back: Option<(NodeId, usize)>,
    remaining: usize,
}

impl<'a> Leafs<'a> {
    pub(crate) fn new(tree: &'a Tree, range: Range<usize>) -> Self {
        if range.is_empty() {
            return Self {
                tree,
                front: None,
                back: None,
                remaining: 0,
            };
        }
        let front = tree.leaf_at(range.start);
        let back = tree
            .leaf_at(range.end - 1)
            .map(|(leaf, offset)| (leaf, offset + 1));
        let remaining = if front.is_some() && back.is_some() {
            range.len()
        } else {
            0
        };
        Self {
            tree,
            front,
            back,
            remaining,
        }
    }

    /// Units not yet yielded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<'a> Iterator for Leafs<'a> {
    type Item = &'a [u16];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (leaf, offset) = self.front?;
        let slice = self.tree.leaf_slice(leaf);
        let take = slice.len().saturating_sub(offset).min(self.remaining);
        self.remaining -= take;
        self.front = self.tree.next_leaf(leaf).map(|next| (next, 0));
        Some(&slice[offset..offset + take])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::from(self.remaining > 0), Some(self.remaining))
    }
}

impl DoubleEndedIterator for Leafs<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (leaf, end) = self.back?;
        let slice = self.tree.leaf_slice(leaf);
        let take = end.min(self.remaining);
        self.remaining -= take;
        self.back = self
            .tree
            .prev_leaf(leaf)
            .map(|prev| (prev, self.tree.leaf_slice(prev).len()));
        Some(&slice[end - take..end])
    }
}

impl FusedIterator for Leafs<'_> {}

/// Code units of a range as [`RopeChar`]s.
#[derive(Debug, Clone)]
pub struct Chars<'a> {
    leafs: Leafs<'a>,
    front: &'a [u16],
    back: &'a [u16],
}

impl<'a> Chars<'a> {
    pub(crate) fn new(tree: &'a Tree, range: Range<usize>) -> Self {
        Self {
            leafs: Leafs::new(tree, range),
            front: &[],
            back: &[],
        }
    }
}

impl Iterator for Chars<'_> {
    type Item = RopeChar;

    fn next(&mut self) -> Option<RopeChar> {
        loop {
            if let Some((&unit, rest)) = self.front.split_first() {
                self.front = rest;
                return Some(RopeChar::new(unit));
            }
            match self.leafs.next() {
                Some(slice) => self.front = slice,
                None => {
                    let (&unit, rest) = self.back.split_first()?;
                    self.back = rest;
                    return Some(RopeChar::new(unit));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.front.len() + self.back.len() + self.leafs.remaining();
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Chars<'_> {
    fn next_back(&mut self) -> Option<RopeChar> {
        loop {
            if let Some((&unit, rest)) = self.back.split_last() {
                self.back = rest;
                return Some(RopeChar::new(unit));
            }
            match self.leafs.next_back() {
                Some(slice) => self.back = slice,
                None => {
                    let (&unit, rest) = self.front.split_last()?;
                    self.front = rest;
                    return Some(RopeChar::new(unit));
                }
            }
        }
    }
}

impl ExactSizeIterator for Chars<'_> {}

impl FusedIterator for Chars<'_> {}

/// Each code unit paired with the one that follows it (if any).
///
/// Layout code uses the lookahead to measure surrogate pairs without re-reading the rope.
#[derive(Debug, Clone)]
pub struct CharPairs<'a> {
    inner: Peekable<Chars<'a>>,
}

impl<'a> CharPairs<'a> {
    pub(crate) fn new(chars: Chars<'a>) -> Self {
        Self {
            inner: chars.peekable(),
        }
    }
}

impl Iterator for CharPairs<'_> {
    type Item = (RopeChar, Option<RopeChar>);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.inner.next()?;
        Some((current, self.inner.peek().copied()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl FusedIterator for CharPairs<'_> {}

/// Non-overlapping occurrences of a needle, found by a naive left-to-right scan.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    tree: &'a Tree,
    needle: Vec<u16>,
    pos: usize,
    end: usize,
}

impl<'a> Matches<'a> {
    pub(crate) fn new(tree: &'a Tree, needle: Vec<u16>, range: Range<usize>) -> Self {
        Self {
            tree,
            needle,
            pos: range.start,
            end: range.end,
        }
    }

    fn matches_at(&self, start: usize) -> bool {
        Chars::new(self.tree, start..start + self.needle.len())
            .map(|c| c.unit)
            .eq(self.needle.iter().copied())
    }
}

impl Iterator for Matches<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let first = *self.needle.first()?;
        let len = self.needle.len();
        while self.pos + len <= self.end {
            let last_start = self.end - len;
            let offset = Chars::new(self.tree, self.pos..last_start + 1)
                .position(|c| c.unit == first);
            let Some(offset) = offset else {
                self.pos = self.end;
                return None;
            };
            let candidate = self.pos + offset;
            if self.matches_at(candidate) {
                self.pos = candidate + len;
                return Some(candidate..candidate + len);
            }
            self.pos = candidate + 1;
        }
        None
    }
}

impl FusedIterator for Matches<'_> {}
