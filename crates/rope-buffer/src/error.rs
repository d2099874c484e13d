//! Error types.
//!
//! Absence conditions (an index past the end, a line beyond the last one, an empty undo stack)
//! are reported with `Option`. The types in this module are reserved for contract violations:
//! misuse of the append-only [`Buffer`](crate::Buffer) and invalid edit coordinates.

use thiserror::Error;

/// Contract violations of [`Buffer`](crate::Buffer) and
/// [`BufferReference`](crate::BufferReference).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The requested capacities cannot describe a usable buffer.
    #[error("invalid buffer capacity: initial {initial}, max {max}")]
    InvalidCapacity {
        /// Requested start capacity.
        initial: usize,
        /// Requested maximum capacity.
        max: usize,
    },
    /// Buffers are append-only; data may only be written at the current length.
    #[error("append-only buffer: insert at {index} but length is {len}")]
    NotAtEnd {
        /// Requested write position.
        index: usize,
        /// Current buffer length.
        len: usize,
    },
    /// A reference window does not fit inside the buffer's written data.
    #[error("reference {start}..{end} out of range for buffer of length {len}")]
    ReferenceOutOfRange {
        /// Inclusive start of the requested window.
        start: usize,
        /// Exclusive end of the requested window.
        end: usize,
        /// Current buffer length.
        len: usize,
    },
}

/// Errors returned by [`Rope`](crate::Rope) operations.
#[derive(Debug, Error)]
pub enum RopeError {
    /// A buffer contract was violated.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// The offset lies past the end of the document.
    #[error("invalid offset: {0}")]
    InvalidOffset(usize),
    /// The range is reversed or extends past the end of the document.
    #[error("invalid range: {start}..{end}")]
    InvalidRange {
        /// Inclusive start offset.
        start: usize,
        /// Exclusive end offset.
        end: usize,
    },
    /// The offset points between the two halves of a surrogate pair.
    #[error("offset {0} splits a surrogate pair")]
    SplitSurrogatePair(usize),
    /// A structural invariant of the tree does not hold.
    #[error("corrupt tree: {0}")]
    CorruptTree(String),
    /// Reading the source stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
