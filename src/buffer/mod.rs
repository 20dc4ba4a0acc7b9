//! Buffer abstractions for frame encoding/decoding
//!
//! Frame headers are fixed-width little-endian integers; these buffers keep
//! the bounds checking in one place.

mod read;
mod write;

pub use read::ReadBuffer;
pub use write::WriteBuffer;
