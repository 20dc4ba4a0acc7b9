//! Write buffer for encoding frame data

use bytes::{BufMut, Bytes, BytesMut};

/// A buffer for writing frame data
#[derive(Debug)]
pub struct WriteBuffer {
    /// The underlying byte buffer
    data: BytesMut,
}

impl WriteBuffer {
    /// Create a new WriteBuffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new WriteBuffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of data in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable Bytes
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a 32-bit unsigned integer in little-endian format
    pub fn write_u32_le(&mut self, value: u32) {
        self.data.put_u32_le(value);
    }

    /// Write a 64-bit unsigned integer in little-endian format
    pub fn write_u64_le(&mut self, value: u64) {
        self.data.put_u64_le(value);
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
