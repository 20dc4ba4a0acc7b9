//! Frame encoding/decoding
//!
//! ```text
//! +----------------------------------+------------------+----------------+
//! | Token (8, little-endian u64)     | Length (4, LE)   | JSON body ...  |
//! +----------------------------------+------------------+----------------+
//! ```

use bytes::Bytes;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::constants::FRAME_HEADER_SIZE;
use crate::error::{Error, Result};

/// Frame header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Query token correlating requests and responses
    pub token: u64,
    /// Body length in bytes, excluding the header
    pub length: u32,
}

impl FrameHeader {
    /// Create a new frame header
    pub fn new(token: u64, length: u32) -> Self {
        Self { token, length }
    }

    /// Parse a frame header from raw bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(Error::FrameTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: data.len(),
            });
        }
        let mut buf = ReadBuffer::from_slice(&data[..FRAME_HEADER_SIZE]);
        Self::read(&mut buf)
    }

    /// Read a frame header from a buffer
    pub fn read(buf: &mut ReadBuffer) -> Result<Self> {
        let token = buf.read_u64_le()?;
        let length = buf.read_u32_le()?;
        Ok(Self { token, length })
    }

    /// Write a frame header to a buffer
    pub fn write(&self, buf: &mut WriteBuffer) {
        buf.write_u64_le(self.token);
        buf.write_u32_le(self.length);
    }

    /// Body length as a usize
    pub fn body_length(&self) -> usize {
        self.length as usize
    }
}

/// A complete frame with header fields and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Query token
    pub token: u64,
    /// The JSON body (everything after the 12-byte header)
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame
    pub fn new(token: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            token,
            payload: payload.into(),
        }
    }

    /// Create a frame from raw bytes (header plus body)
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let header = FrameHeader::parse(&data)?;
        let expected = FRAME_HEADER_SIZE + header.body_length();
        if data.len() < expected {
            return Err(Error::FrameTooShort {
                expected,
                actual: data.len(),
            });
        }
        let payload = data.slice(FRAME_HEADER_SIZE..expected);
        Ok(Self {
            token: header.token,
            payload,
        })
    }

    /// Header describing this frame
    pub fn header(&self) -> Result<FrameHeader> {
        let length = u32::try_from(self.payload.len()).map_err(|_| Error::FrameTooLarge {
            length: self.payload.len(),
            max: u32::MAX as usize,
        })?;
        Ok(FrameHeader::new(self.token, length))
    }

    /// Encode the frame to wire bytes
    pub fn encode(&self) -> Result<Bytes> {
        let header = self.header()?;
        let mut buf = WriteBuffer::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        header.write(&mut buf);
        buf.write_bytes(&self.payload);
        Ok(buf.freeze())
    }

    /// Total encoded size
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }
}
