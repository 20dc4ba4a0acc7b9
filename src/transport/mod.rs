//! Transport layer
//!
//! The connection talks to the server through a pair of frame-oriented
//! halves: [`FrameRead`] delivers inbound frames, [`FrameWrite`] sends
//! outbound ones. Any tokio byte stream can be adapted with [`split`].

mod registry;
mod stream;
mod tcp;

pub(crate) use registry::CursorRegistry;
pub use stream::{split, FrameReader, FrameWriter};
pub use tcp::connect_tcp;

use crate::error::Result;
use crate::protocol::Frame;

/// Inbound half of a transport
#[async_trait::async_trait]
pub trait FrameRead: Send {
    /// Read the next frame; `Ok(None)` means the peer closed cleanly
    async fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Outbound half of a transport
#[async_trait::async_trait]
pub trait FrameWrite: Send {
    /// Write one frame and flush it
    async fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Shut the outbound direction down
    async fn shutdown(&mut self) -> Result<()>;
}
