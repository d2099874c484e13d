//! Rope tuning knobs.

use crate::error::BufferError;

/// Capacity and chunking settings used when a [`Rope`](crate::Rope) allocates buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopeConfig {
    /// Capacity (in UTF-16 code units) a fresh buffer starts with.
    pub initial_buffer_capacity: usize,
    /// Upper bound a buffer may grow to. Text longer than this is spread across buffers.
    pub max_buffer_capacity: usize,
    /// Number of bytes read per chunk by [`Rope::from_reader`](crate::Rope::from_reader).
    pub stream_chunk_size: usize,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: 32,
            max_buffer_capacity: 16 * 1024,
            stream_chunk_size: 64 * 1024,
        }
    }
}

impl RopeConfig {
    /// Create a config with custom buffer capacities and the default chunk size.
    pub fn with_capacities(initial_buffer_capacity: usize, max_buffer_capacity: usize) -> Self {
        Self {
            initial_buffer_capacity,
            max_buffer_capacity,
            ..Self::default()
        }
    }

    /// Check that buffers can be created with these capacities.
    ///
    /// A maximum below 2 could never hold a surrogate pair, so it is rejected.
    /// A zero chunk size is treated like the smallest useful one (4 bytes) at load time.
    pub fn validate(&self) -> Result<(), BufferError> {
        let initial = self.initial_buffer_capacity;
        let max = self.max_buffer_capacity;
        if initial == 0 || max < 2 || initial > max {
            return Err(BufferError::InvalidCapacity { initial, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RopeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_capacities() {
        assert!(RopeConfig::with_capacities(0, 16).validate().is_err());
        assert!(RopeConfig::with_capacities(1, 1).validate().is_err());
        assert!(RopeConfig::with_capacities(32, 16).validate().is_err());
        assert!(RopeConfig::with_capacities(2, 2).validate().is_ok());
    }
}
