//! Append-only UTF-16 storage blocks.
//!
//! A [`Buffer`] is the unit of allocation of the rope. Leaves never own text directly; they hold
//! a [`BufferReference`] window into a shared `Rc<Buffer>`. Buffers only ever grow at their end,
//! so a window, once created, keeps pointing at the same code units for its whole lifetime.
//!
//! # Views and growth
//!
//! [`Buffer::get`] hands out a borrowed slice. Growing a buffer may reallocate its storage, which
//! would invalidate any outstanding view; here that is enforced by the borrow checker: growth
//! requires `&mut Buffer`, which the rope only obtains through `Rc::get_mut`, and that fails while
//! any other reference (and therefore any view derived from it) is alive.

use crate::buffer_ref::BufferReference;
use crate::error::BufferError;
use std::rc::Rc;

/// Returns `true` for the first half of a UTF-16 surrogate pair.
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Returns `true` for the second half of a UTF-16 surrogate pair.
pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// How many code units the character starting at a position occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharWidth {
    /// A BMP character (or an unpaired surrogate).
    Single,
    /// A high surrogate: the character spans this unit and the next one.
    PairStart,
    /// A low surrogate: the continuation of a pair, not a valid iteration start.
    PairContinuation,
}

impl CharWidth {
    /// Classify a single code unit.
    pub fn of(unit: u16) -> Self {
        if is_high_surrogate(unit) {
            Self::PairStart
        } else if is_low_surrogate(unit) {
            Self::PairContinuation
        } else {
            Self::Single
        }
    }

    /// Signed width: `1`, `2` for a pair start, `-1` for a continuation.
    pub fn units(self) -> isize {
        match self {
            Self::Single => 1,
            Self::PairStart => 2,
            Self::PairContinuation => -1,
        }
    }
}

/// Growable, append-only array of UTF-16 code units.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u16>,
    capacity: usize,
    max_capacity: usize,
}

impl Buffer {
    /// Create an empty buffer that starts with `initial` units of capacity and may grow up to
    /// `max`.
    pub fn with_capacity(initial: usize, max: usize) -> Result<Self, BufferError> {
        if initial == 0 || max < 2 || initial > max {
            return Err(BufferError::InvalidCapacity { initial, max });
        }
        Ok(Self {
            data: Vec::with_capacity(initial),
            capacity: initial,
            max_capacity: max,
        })
    }

    /// Number of code units written.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity the buffer may grow to.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Returns `true` once the buffer has reached its maximum size.
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.max_capacity
    }

    /// Zero-copy view of `len` units starting at `start`, or `None` if out of range.
    pub fn get(&self, start: usize, len: usize) -> Option<&[u16]> {
        self.data.get(start..start.checked_add(len)?)
    }

    /// The code unit at `idx` together with its [`CharWidth`].
    pub fn get_char(&self, idx: usize) -> Option<(u16, CharWidth)> {
        self.data.get(idx).map(|&unit| (unit, CharWidth::of(unit)))
    }

    /// Create a reference to the window `start..start + len`.
    pub fn create_reference(
        self: &Rc<Self>,
        start: usize,
        len: usize,
    ) -> Result<BufferReference, BufferError> {
        BufferReference::new(Rc::clone(self), start, len)
    }

    /// Append `src` at `start`, which must equal the current length.
    ///
    /// Writes as much as fits below the maximum capacity and returns the number of units
    /// written. The write never ends on a high surrogate whose partner did not fit; the
    /// caller is responsible for the remainder.
    pub fn insert(&mut self, start: usize, src: &[u16]) -> Result<usize, BufferError> {
        if start != self.data.len() {
            return Err(BufferError::NotAtEnd {
                index: start,
                len: self.data.len(),
            });
        }

        let room = self.max_capacity.saturating_sub(self.data.len());
        let mut count = src.len().min(room);
        if count > 0 && count < src.len() && is_high_surrogate(src[count - 1]) {
            count -= 1;
        }
        if count == 0 {
            return Ok(0);
        }

        self.grow_to(self.data.len() + count);
        self.data.extend_from_slice(&src[..count]);
        Ok(count)
    }

    /// Double the capacity until `needed` units fit, capped at the maximum.
    fn grow_to(&mut self, needed: usize) {
        if needed <= self.capacity {
            return;
        }
        let mut capacity = self.capacity;
        while capacity < needed {
            capacity = capacity.saturating_mul(2).min(self.max_capacity);
        }
        self.data.reserve_exact(capacity - self.data.len());
        self.capacity = capacity;
    }
}
