//! Undo/redo log of structural edits.
//!
//! Modifications are expressed in UTF-16 code unit offsets at the time they were applied.
//! A removal keeps the removed [`BufferReference`]s so the exact text can be put back without
//! copying it.

use crate::buffer_ref::BufferReference;

/// Text inserted at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertModification {
    /// Offset of the first inserted unit.
    pub start: usize,
    /// Number of inserted units.
    pub len: usize,
}

/// Text removed from `start`, kept alive for undo.
#[derive(Debug, Clone)]
pub struct RemoveModification {
    /// Offset of the first removed unit.
    pub start: usize,
    /// Number of removed units.
    pub len: usize,
    /// The removed text, in document order.
    pub buffer_refs: Vec<BufferReference>,
}

impl RemoveModification {
    /// The removed text as code units.
    pub fn removed_units(&self) -> Vec<u16> {
        self.buffer_refs
            .iter()
            .flat_map(|r| r.as_slice().iter().copied())
            .collect()
    }

    /// The removed text, decoded lossily.
    pub fn removed_text(&self) -> String {
        String::from_utf16_lossy(&self.removed_units())
    }
}

/// A committed structural change.
#[derive(Debug, Clone)]
pub enum Modification {
    /// Plain insertion.
    Insert(InsertModification),
    /// Plain removal.
    Remove(RemoveModification),
    /// A removal followed by an insertion, undone as one step.
    Replace {
        /// The removal, applied first.
        remove: RemoveModification,
        /// The insertion, applied second.
        insert: InsertModification,
    },
}

impl Modification {
    /// Offset where the change begins.
    pub fn start(&self) -> usize {
        match self {
            Self::Insert(insert) => insert.start,
            Self::Remove(remove) => remove.start,
            Self::Replace { remove, .. } => remove.start,
        }
    }

    /// Number of units inserted by this change.
    pub fn inserted_len(&self) -> usize {
        match self {
            Self::Insert(insert) | Self::Replace { insert, .. } => insert.len,
            Self::Remove(_) => 0,
        }
    }

    /// Number of units removed by this change.
    pub fn removed_len(&self) -> usize {
        match self {
            Self::Remove(remove) | Self::Replace { remove, .. } => remove.len,
            Self::Insert(_) => 0,
        }
    }
}

/// Two LIFO stacks of modifications.
#[derive(Debug, Default)]
pub struct ModificationsStack {
    undo: Vec<Modification>,
    redo: Vec<Modification>,
}

impl ModificationsStack {
    /// Create empty stacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh edit. This discards the redo branch.
    pub fn push(&mut self, modification: Modification) {
        self.redo.clear();
        self.undo.push(modification);
    }

    /// Record the inverse of a redone change, keeping the redo branch.
    pub(crate) fn push_undo(&mut self, modification: Modification) {
        self.undo.push(modification);
    }

    /// Record the inverse of an undone change.
    pub(crate) fn push_redo(&mut self, modification: Modification) {
        self.redo.push(modification);
    }

    /// Take the latest edit.
    pub fn pop_undo(&mut self) -> Option<Modification> {
        self.undo.pop()
    }

    /// Take the latest undone edit.
    pub fn pop_redo(&mut self) -> Option<Modification> {
        self.redo.pop()
    }

    /// The latest edit, if any.
    pub fn last_undo(&self) -> Option<&Modification> {
        self.undo.last()
    }

    /// The latest undone edit, if any.
    pub fn last_redo(&self) -> Option<&Modification> {
        self.redo.last()
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable edits.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable edits.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(start: usize, len: usize) -> Modification {
        Modification::Insert(InsertModification { start, len })
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = ModificationsStack::new();
        stack.push(insert(0, 1));
        stack.push(insert(1, 1));

        let undone = stack.pop_undo().unwrap();
        stack.push_redo(undone);
        assert!(stack.can_redo());
        assert_eq!(stack.undo_depth(), 1);

        stack.push(insert(1, 2));
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_depth(), 2);
    }

    #[test]
    fn test_push_undo_keeps_redo() {
        let mut stack = ModificationsStack::new();
        stack.push_redo(insert(0, 1));
        stack.push_redo(insert(1, 1));
        let redone = stack.pop_redo().unwrap();
        stack.push_undo(redone);
        assert_eq!(stack.redo_depth(), 1);
        assert_eq!(stack.undo_depth(), 1);
        assert_eq!(stack.last_undo().unwrap().start(), 1);
    }

    #[test]
    fn test_lengths() {
        let m = Modification::Replace {
            remove: RemoveModification {
                start: 3,
                len: 2,
                buffer_refs: Vec::new(),
            },
            insert: InsertModification { start: 3, len: 5 },
        };
        assert_eq!(m.start(), 3);
        assert_eq!(m.removed_len(), 2);
        assert_eq!(m.inserted_len(), 5);
    }

    #[test]
    fn test_clear() {
        let mut stack = ModificationsStack::new();
        stack.push(insert(0, 1));
        stack.push_redo(insert(2, 1));
        stack.clear();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert!(stack.pop_undo().is_none());
    }
}
