//! The rope facade.
//!
//! [`Rope`] owns the tree of buffer references and the undo/redo log, and exposes every public
//! operation: construction from text or bytes, editing, undo/redo, index translation and
//! iteration. All offsets are UTF-16 code unit offsets.
//!
//! # Example
//!
//! ```rust
//! use rope_buffer::Rope;
//!
//! let mut rope = Rope::from_text("Hello\nWorld");
//! rope.insert(5, ", there").unwrap();
//! assert_eq!(rope.to_string(), "Hello, there\nWorld");
//! assert_eq!(rope.line_index_for_char(13), Some(1));
//!
//! let caret = rope.undo().unwrap();
//! assert_eq!(caret, Some(5));
//! assert_eq!(rope.to_string(), "Hello\nWorld");
//! ```

use crate::buffer::{is_high_surrogate, is_low_surrogate};
use crate::buffer_ref::BufferReference;
use crate::config::RopeConfig;
use crate::counts::LINE_FEED;
use crate::encoding::{StreamDecoder, TextEncoding, decode_all};
use crate::error::RopeError;
use crate::iter::{CharPairs, Chars, Leafs, Matches, RopeChar};
use crate::modification::{
    InsertModification, Modification, ModificationsStack, RemoveModification,
};
use crate::node::{Side, Tree};
use std::fmt;
use std::io::Read;
use std::ops::Range;

/// What caused a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationOrigin {
    /// A fresh `insert`, `remove` or `replace`.
    Edit,
    /// An `undo`; the modification is the applied inverse.
    Undo,
    /// A `redo`; the modification is the re-applied change.
    Redo,
}

/// Notification sent to subscribers after every committed change.
#[derive(Debug, Clone, Copy)]
pub struct ModificationEvent<'a> {
    /// What caused the change.
    pub origin: ModificationOrigin,
    /// The modification that was applied to the text.
    pub modification: &'a Modification,
    /// Rope version after the change.
    pub version: u64,
}

/// Change subscriber.
pub type ModificationCallback = Box<dyn FnMut(&ModificationEvent<'_>)>;

/// A rope-based UTF-16 text buffer.
pub struct Rope {
    tree: Tree,
    modifications: ModificationsStack,
    config: RopeConfig,
    version: u64,
    callbacks: Vec<ModificationCallback>,
}

impl Rope {
    /// Create an empty rope with the default [`RopeConfig`].
    pub fn new() -> Self {
        // The default capacities always pass `RopeConfig::validate`.
        Self::with_config(RopeConfig::default()).expect("default config is valid")
    }

    /// Create an empty rope.
    pub fn with_config(config: RopeConfig) -> Result<Self, RopeError> {
        config.validate()?;
        Ok(Self {
            tree: Tree::new(config.initial_buffer_capacity, config.max_buffer_capacity)?,
            modifications: ModificationsStack::new(),
            config,
            version: 0,
            callbacks: Vec::new(),
        })
    }

    /// Build a rope holding `text`.
    pub fn from_text(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self::from_utf16(&units)
    }

    /// Build a rope holding `text`, allocating buffers according to `config`.
    pub fn from_text_with_config(text: &str, config: RopeConfig) -> Result<Self, RopeError> {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self::from_utf16_with_config(&units, config)
    }

    /// Build a rope from UTF-16 code units.
    pub fn from_utf16(units: &[u16]) -> Self {
        // Only a config error can fail here, and the default config validates.
        Self::from_utf16_with_config(units, RopeConfig::default())
            .expect("default config is valid")
    }

    /// Build a rope from UTF-16 code units, allocating buffers according to `config`.
    pub fn from_utf16_with_config(units: &[u16], config: RopeConfig) -> Result<Self, RopeError> {
        let mut rope = Self::with_config(config)?;
        rope.load(units)?;
        Ok(rope)
    }

    /// Decode `bytes` and build a rope from them. A leading BOM of `encoding` is skipped.
    pub fn from_bytes(bytes: &[u8], encoding: TextEncoding) -> Self {
        Self::from_utf16(&decode_all(bytes, encoding))
    }

    /// Decode `bytes` and build a rope from them, allocating buffers according to `config`.
    pub fn from_bytes_with_config(
        bytes: &[u8],
        encoding: TextEncoding,
        config: RopeConfig,
    ) -> Result<Self, RopeError> {
        Self::from_utf16_with_config(&decode_all(bytes, encoding), config)
    }

    /// Read and decode a stream chunk by chunk.
    pub fn from_reader<R: Read>(reader: R, encoding: TextEncoding) -> Result<Self, RopeError> {
        Self::from_reader_with_config(reader, encoding, RopeConfig::default())
    }

    /// Read and decode a stream chunk by chunk, allocating buffers according to `config`.
    ///
    /// A chunk that ends inside a character keeps the incomplete bytes for the next chunk.
    pub fn from_reader_with_config<R: Read>(
        mut reader: R,
        encoding: TextEncoding,
        config: RopeConfig,
    ) -> Result<Self, RopeError> {
        let mut rope = Self::with_config(config)?;
        let mut decoder = StreamDecoder::new(encoding);
        let mut chunk = vec![0u8; config.stream_chunk_size.max(4)];
        let mut units = Vec::with_capacity(chunk.len());
        let mut chunks = 0usize;
        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            chunks += 1;
            units.clear();
            let carried = decoder.decode(&chunk[..read], &mut units);
            if carried > 0 {
                tracing::trace!(carried, "chunk ends inside a character");
            }
            rope.load(&units)?;
        }
        units.clear();
        decoder.finish(&mut units);
        rope.load(&units)?;
        tracing::debug!(
            chunks,
            units = rope.char_count(),
            leaves = rope.leaf_count(),
            "loaded rope from stream"
        );
        Ok(rope)
    }

    /// Append text at the end without recording a modification.
    fn load(&mut self, units: &[u16]) -> Result<(), RopeError> {
        let end = self.char_count();
        self.insert_units(end, units)
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Insert `text` at `idx`.
    pub fn insert(&mut self, idx: usize, text: &str) -> Result<(), RopeError> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.insert_utf16(idx, &units)
    }

    /// Insert code units at `idx`.
    pub fn insert_utf16(&mut self, idx: usize, units: &[u16]) -> Result<(), RopeError> {
        self.check_offset(idx)?;
        if units.is_empty() {
            return Ok(());
        }
        self.check_seams(idx, idx, units)?;
        self.insert_units(idx, units)?;
        self.commit(Modification::Insert(InsertModification {
            start: idx,
            len: units.len(),
        }));
        Ok(())
    }

    /// Remove `len` units starting at `idx`.
    pub fn remove(&mut self, idx: usize, len: usize) -> Result<(), RopeError> {
        self.check_range(idx, len)?;
        if len == 0 {
            return Ok(());
        }
        self.check_seams(idx, idx + len, &[])?;
        let removed = self.remove_units(idx, len)?;
        self.commit(Modification::Remove(removed));
        Ok(())
    }

    /// Replace `len` units at `idx` with `text`; undone as a single step.
    pub fn replace(&mut self, idx: usize, len: usize, text: &str) -> Result<(), RopeError> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.replace_utf16(idx, len, &units)
    }

    /// Replace `len` units at `idx` with code units; undone as a single step.
    pub fn replace_utf16(&mut self, idx: usize, len: usize, units: &[u16]) -> Result<(), RopeError> {
        self.check_range(idx, len)?;
        if len == 0 && units.is_empty() {
            return Ok(());
        }
        self.check_seams(idx, idx + len, units)?;
        let remove = self.remove_units(idx, len)?;
        self.insert_units(idx, units)?;
        self.commit(Modification::Replace {
            remove,
            insert: InsertModification {
                start: idx,
                len: units.len(),
            },
        });
        Ok(())
    }

    /// Revert the latest edit and return the caret position after it: the end of re-inserted
    /// text for an undone removal, the start of the removed text for an undone insertion.
    ///
    /// Returns `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<usize>, RopeError> {
        let Some(modification) = self.modifications.pop_undo() else {
            return Ok(None);
        };
        let (inverse, caret) = self.apply_inverse(modification)?;
        tracing::debug!(caret, undo_depth = self.modifications.undo_depth(), "undo");
        self.modifications.push_redo(inverse);
        self.notify(ModificationOrigin::Undo);
        Ok(Some(caret))
    }

    /// Re-apply the latest undone edit and return the caret position after it.
    ///
    /// Returns `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<usize>, RopeError> {
        let Some(modification) = self.modifications.pop_redo() else {
            return Ok(None);
        };
        let (inverse, caret) = self.apply_inverse(modification)?;
        tracing::debug!(caret, redo_depth = self.modifications.redo_depth(), "redo");
        self.modifications.push_undo(inverse);
        self.notify(ModificationOrigin::Redo);
        Ok(Some(caret))
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.modifications.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.modifications.can_redo()
    }

    /// Number of undoable edits.
    pub fn undo_depth(&self) -> usize {
        self.modifications.undo_depth()
    }

    /// Number of redoable edits.
    pub fn redo_depth(&self) -> usize {
        self.modifications.redo_depth()
    }

    /// The undo/redo log.
    pub fn modifications(&self) -> &ModificationsStack {
        &self.modifications
    }

    /// Forget all undo/redo history; releases the text it kept alive.
    pub fn clear_history(&mut self) {
        self.modifications.clear();
    }

    /// Register a callback run after every committed change.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ModificationEvent<'_>) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of committed changes so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn commit(&mut self, modification: Modification) {
        self.modifications.push(modification);
        self.notify(ModificationOrigin::Edit);
    }

    fn notify(&mut self, origin: ModificationOrigin) {
        self.version += 1;
        let modification = match origin {
            ModificationOrigin::Edit | ModificationOrigin::Redo => self.modifications.last_undo(),
            ModificationOrigin::Undo => self.modifications.last_redo(),
        };
        let Some(modification) = modification else {
            return;
        };
        let event = ModificationEvent {
            origin,
            modification,
            version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    fn check_offset(&self, idx: usize) -> Result<(), RopeError> {
        if idx > self.char_count() {
            return Err(RopeError::InvalidOffset(idx));
        }
        if self.splits_pair(idx) {
            return Err(RopeError::SplitSurrogatePair(idx));
        }
        Ok(())
    }

    fn check_range(&self, idx: usize, len: usize) -> Result<(), RopeError> {
        let end = idx
            .checked_add(len)
            .filter(|&end| end <= self.char_count())
            .ok_or(RopeError::InvalidRange {
                start: idx,
                end: idx.saturating_add(len),
            })?;
        for offset in [idx, end] {
            if self.splits_pair(offset) {
                return Err(RopeError::SplitSurrogatePair(offset));
            }
        }
        Ok(())
    }

    /// Reject an edit that replaces `start..end` with `units` when it would bring a lone high
    /// surrogate next to a lone low surrogate. Such a pair would straddle a leaf boundary.
    fn check_seams(&self, start: usize, end: usize, units: &[u16]) -> Result<(), RopeError> {
        let before = start.checked_sub(1).and_then(|i| self.tree.unit_at(i));
        let after = self.tree.unit_at(end);
        let (first, last) = (units.first().copied(), units.last().copied());
        if (units.is_empty() && joins_pair(before, after)) || joins_pair(before, first) {
            return Err(RopeError::SplitSurrogatePair(start));
        }
        if joins_pair(last, after) {
            return Err(RopeError::SplitSurrogatePair(end));
        }
        Ok(())
    }

    /// Whether `idx` falls between the two halves of a surrogate pair.
    pub(crate) fn splits_pair(&self, idx: usize) -> bool {
        idx > 0
            && self.tree.unit_at(idx).is_some_and(is_low_surrogate)
            && self.tree.unit_at(idx - 1).is_some_and(is_high_surrogate)
    }

    /// Insert without recording: extend the leaf ending at `idx` in place where possible and
    /// graft the rest in new buffers.
    fn insert_units(&mut self, idx: usize, units: &[u16]) -> Result<(), RopeError> {
        if units.is_empty() {
            return Ok(());
        }
        let (leaf, offset) = self
            .tree
            .leaf_ending_at(idx)
            .ok_or(RopeError::InvalidOffset(idx))?;

        let mut written = 0;
        if offset == self.tree.leaf_slice(leaf).len() {
            written = self.tree.append_to_leaf(leaf, units)?;
        }

        let rest = &units[written..];
        if !rest.is_empty() {
            let refs = BufferReference::pack(
                rest,
                self.tree.initial_capacity(),
                self.tree.max_capacity(),
            )?;
            self.graft_at(idx + written, refs);
        }
        Ok(())
    }

    /// Put `refs` into the tree so that their text starts at `idx`.
    fn graft_at(&mut self, idx: usize, refs: Vec<BufferReference>) {
        if refs.is_empty() {
            return;
        }
        self.tree.split_before(idx);
        let (leaf, side) = match self.tree.leaf_ending_at(idx) {
            Some((leaf, _)) if idx > 0 => (leaf, Side::After),
            Some((leaf, _)) => (leaf, Side::Before),
            None => (self.tree.last_leaf(), Side::After),
        };
        self.tree.graft(leaf, side, refs);
    }

    /// Detach the leaves covering `idx..idx + len` and keep their references.
    fn remove_units(&mut self, idx: usize, len: usize) -> Result<RemoveModification, RopeError> {
        self.tree.split_before(idx);
        self.tree.split_before(idx + len);

        let mut leaves = Vec::new();
        let mut covered = 0;
        let mut current = self.tree.leaf_at(idx).map(|(leaf, _)| leaf);
        while covered < len {
            let Some(leaf) = current else {
                break;
            };
            covered += self.tree.leaf_slice(leaf).len();
            leaves.push(leaf);
            current = self.tree.next_leaf(leaf);
        }

        let mut buffer_refs = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            buffer_refs.push(self.tree.remove_leaf(leaf)?);
        }
        Ok(RemoveModification {
            start: idx,
            len,
            buffer_refs,
        })
    }

    /// Apply the structural inverse of `modification`; returns that inverse and the caret.
    fn apply_inverse(
        &mut self,
        modification: Modification,
    ) -> Result<(Modification, usize), RopeError> {
        match modification {
            Modification::Insert(insert) => {
                let start = insert.start;
                let removed = self.remove_units(insert.start, insert.len)?;
                Ok((Modification::Remove(removed), start))
            }
            Modification::Remove(remove) => {
                let inserted = self.reinsert(remove);
                let caret = inserted.start + inserted.len;
                Ok((Modification::Insert(inserted), caret))
            }
            Modification::Replace { remove, insert } => {
                let removed = self.remove_units(insert.start, insert.len)?;
                let inserted = self.reinsert(remove);
                let caret = inserted.start + inserted.len;
                Ok((
                    Modification::Replace {
                        remove: removed,
                        insert: inserted,
                    },
                    caret,
                ))
            }
        }
    }

    /// Put removed text back where it came from.
    fn reinsert(&mut self, remove: RemoveModification) -> InsertModification {
        let RemoveModification {
            start,
            len,
            buffer_refs,
        } = remove;
        self.graft_at(start, buffer_refs);
        InsertModification { start, len }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The configuration buffers are allocated with.
    pub fn config(&self) -> &RopeConfig {
        &self.config
    }

    /// Total number of UTF-16 code units.
    pub fn char_count(&self) -> usize {
        self.tree.char_count()
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.char_count() == 0
    }

    /// Total number of `'\n'` line breaks.
    pub fn line_break_count(&self) -> usize {
        self.tree.total_counts().line_breaks as usize
    }

    /// Number of lines (line breaks + 1).
    pub fn line_count(&self) -> usize {
        self.line_break_count() + 1
    }

    /// The code unit at `idx`.
    pub fn char_at(&self, idx: usize) -> Option<RopeChar> {
        self.tree.unit_at(idx).map(RopeChar::new)
    }

    /// Code units of `range` (clamped to the document).
    pub fn text_utf16(&self, range: Range<usize>) -> Vec<u16> {
        let range = self.clamp_range(range);
        let mut out = Vec::with_capacity(range.len());
        for slice in Leafs::new(&self.tree, range) {
            out.extend_from_slice(slice);
        }
        out
    }

    /// Text of `range` (clamped to the document); unpaired surrogates decode to U+FFFD.
    pub fn text(&self, range: Range<usize>) -> String {
        String::from_utf16_lossy(&self.text_utf16(range))
    }

    /// Index of the line containing `idx`; `idx == char_count()` is on the last line.
    pub fn line_index_for_char(&self, idx: usize) -> Option<usize> {
        self.tree.line_index_for_char(idx)
    }

    /// Offset of the first character of `line`.
    pub fn first_char_index_at_line(&self, line: usize) -> Option<usize> {
        self.tree.first_char_index_at_line(line)
    }

    /// Length of `line`, including its trailing `'\n'`.
    pub fn char_count_at_line(&self, line: usize) -> Option<usize> {
        let start = self.first_char_index_at_line(line)?;
        let end = self
            .first_char_index_at_line(line + 1)
            .unwrap_or_else(|| self.char_count());
        Some(end - start)
    }

    /// Text of `line` without its line terminator (`"\n"` or `"\r\n"`).
    pub fn line_text(&self, line: usize) -> Option<String> {
        let start = self.first_char_index_at_line(line)?;
        let len = self.char_count_at_line(line)?;
        let mut units = self.text_utf16(start..start + len);
        if units.last() == Some(&LINE_FEED) {
            units.pop();
            if units.last() == Some(&u16::from(b'\r')) {
                units.pop();
            }
        }
        Some(String::from_utf16_lossy(&units))
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.tree.leaf_count()
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Rebuild the tree as a balanced tree over its current leaves.
    ///
    /// Edits never rebalance on their own; long sessions of scattered edits can call this
    /// between operations to restore logarithmic depth.
    pub fn rebalance(&mut self) -> Result<(), RopeError> {
        let before = self.tree.depth();
        self.tree.rebalance()?;
        tracing::debug!(before, after = self.tree.depth(), "rebalanced rope");
        Ok(())
    }

    /// Verify the cached counts and structure of the tree.
    pub fn check_invariants(&self) -> Result<(), RopeError> {
        self.tree.check_invariants().map_err(RopeError::CorruptTree)
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    /// Clamp `range` to the document and widen it so it does not cut a surrogate pair.
    fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let mut end = range.end.min(self.char_count());
        let mut start = range.start.min(end);
        if self.splits_pair(start) {
            start -= 1;
        }
        if self.splits_pair(end) {
            end += 1;
        }
        start..end
    }

    /// Leaf slices covering `range`.
    pub fn leafs(&self, range: Range<usize>) -> Leafs<'_> {
        Leafs::new(&self.tree, self.clamp_range(range))
    }

    /// Leaf slices covering `range`, last first.
    pub fn leafs_rev(&self, range: Range<usize>) -> std::iter::Rev<Leafs<'_>> {
        self.leafs(range).rev()
    }

    /// Code units of `range`.
    pub fn chars(&self, range: Range<usize>) -> Chars<'_> {
        Chars::new(&self.tree, self.clamp_range(range))
    }

    /// Code units of `range`, last first.
    pub fn chars_rev(&self, range: Range<usize>) -> std::iter::Rev<Chars<'_>> {
        self.chars(range).rev()
    }

    /// Code units of `range`, each paired with its successor.
    pub fn char_pairs(&self, range: Range<usize>) -> CharPairs<'_> {
        CharPairs::new(self.chars(range))
    }

    /// Characters of `range`, decoded; unpaired surrogates become U+FFFD.
    pub fn decoded_chars(&self, range: Range<usize>) -> impl Iterator<Item = char> + '_ {
        char::decode_utf16(self.chars(range).map(|c| c.unit))
            .map(|decoded| decoded.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Non-overlapping occurrences of `needle` fully inside `range`.
    pub fn find_all(&self, needle: &str, range: Range<usize>) -> Matches<'_> {
        let range = self.clamp_range(range);
        Matches::new(&self.tree, needle.encode_utf16().collect(), range)
    }
}

/// Whether `high` followed by `low` decodes as one character.
fn joins_pair(high: Option<u16>, low: Option<u16>) -> bool {
    high.is_some_and(is_high_surrogate) && low.is_some_and(is_low_surrogate)
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.decoded_chars(0..self.char_count()) {
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rope")
            .field("char_count", &self.char_count())
            .field("line_breaks", &self.line_break_count())
            .field("leaves", &self.leaf_count())
            .field("undo_depth", &self.undo_depth())
            .field("redo_depth", &self.redo_depth())
            .field("version", &self.version)
            .finish()
    }
}
