//! Bounded windows into shared buffers.

use crate::buffer::Buffer;
use crate::counts::Counts;
use crate::error::BufferError;
use std::rc::Rc;

/// A `start..start + len` window into a shared [`Buffer`].
///
/// Several references may alias one buffer (after a leaf split, or while removed text is kept
/// for undo). The number of live references is the buffer's `Rc` strong count; cloning a
/// reference raises it and dropping one lowers it.
#[derive(Debug, Clone)]
pub struct BufferReference {
    buffer: Rc<Buffer>,
    start: usize,
    len: usize,
}

impl BufferReference {
    pub(crate) fn new(buffer: Rc<Buffer>, start: usize, len: usize) -> Result<Self, BufferError> {
        let end = start.saturating_add(len);
        if end > buffer.len() {
            return Err(BufferError::ReferenceOutOfRange {
                start,
                end,
                len: buffer.len(),
            });
        }
        Ok(Self { buffer, start, len })
    }

    /// Create a reference over a fresh, empty buffer.
    pub fn empty(initial_capacity: usize, max_capacity: usize) -> Result<Self, BufferError> {
        let buffer = Buffer::with_capacity(initial_capacity, max_capacity)?;
        Ok(Self {
            buffer: Rc::new(buffer),
            start: 0,
            len: 0,
        })
    }

    /// Copy `units` into as many new buffers as needed, each at most `max_capacity` long, and
    /// return one reference per buffer.
    pub fn pack(
        units: &[u16],
        initial_capacity: usize,
        max_capacity: usize,
    ) -> Result<Vec<Self>, BufferError> {
        let mut refs = Vec::new();
        let mut rest = units;
        while !rest.is_empty() {
            let capacity = rest.len().clamp(initial_capacity, max_capacity);
            let mut buffer = Buffer::with_capacity(capacity, max_capacity)?;
            let written = buffer.insert(0, rest)?;
            if written == 0 {
                break;
            }
            tracing::debug!(units = written, capacity, "allocated buffer");
            refs.push(Self {
                buffer: Rc::new(buffer),
                start: 0,
                len: written,
            });
            rest = &rest[written..];
        }
        Ok(refs)
    }

    /// Start of the window inside the buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of code units in the window.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for an empty window.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The shared buffer.
    pub fn buffer(&self) -> &Rc<Buffer> {
        &self.buffer
    }

    /// Number of live references to the underlying buffer, this one included.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.buffer)
    }

    /// The referenced code units.
    pub fn as_slice(&self) -> &[u16] {
        self.buffer.get(self.start, self.len).unwrap_or(&[])
    }

    /// Counts of the referenced text.
    pub fn counts(&self) -> Counts {
        Counts::of(self.as_slice())
    }

    /// Whether data may be written in place at buffer index `buffer_idx`.
    ///
    /// Only the sole reference to a buffer may extend it, only at the buffer's logical end, and
    /// only while the buffer is below its maximum size.
    pub fn can_append_data(&self, buffer_idx: usize) -> bool {
        buffer_idx == self.buffer.len()
            && !self.buffer.is_full()
            && Rc::strong_count(&self.buffer) <= 1
    }

    /// Extend this window in place by appending `src` to the buffer.
    ///
    /// Returns the number of units written, which is `0` whenever
    /// [`can_append_data`](Self::can_append_data) does not hold for the window's end.
    pub fn append(&mut self, src: &[u16]) -> Result<usize, BufferError> {
        let end = self.start + self.len;
        if !self.can_append_data(end) {
            return Ok(0);
        }
        let Some(buffer) = Rc::get_mut(&mut self.buffer) else {
            return Ok(0);
        };
        let written = buffer.insert(end, src)?;
        self.len += written;
        Ok(written)
    }

    /// Split into `start..start + offset` and the rest; both halves share the buffer.
    pub(crate) fn split_at(&self, offset: usize) -> (Self, Self) {
        let offset = offset.min(self.len);
        let left = Self {
            buffer: Rc::clone(&self.buffer),
            start: self.start,
            len: offset,
        };
        let right = Self {
            buffer: Rc::clone(&self.buffer),
            start: self.start + offset,
            len: self.len - offset,
        };
        (left, right)
    }
}
