//! Frame codec over tokio byte streams

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::constants::FRAME_HEADER_SIZE;
use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameHeader};

use super::{FrameRead, FrameWrite};

/// Reads frames from a byte stream
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_frame_len: usize,
}

impl<R> FrameReader<R> {
    /// Wrap a byte stream, rejecting bodies longer than `max_frame_len`
    pub fn new(inner: R, max_frame_len: usize) -> Self {
        Self {
            inner,
            max_frame_len,
        }
    }
}

#[async_trait::async_trait]
impl<R> FrameRead for FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = self.inner.read(&mut header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::ConnectionLost(
                    "connection closed inside a frame header".to_string(),
                ));
            }
            filled += n;
        }

        let header = FrameHeader::parse(&header)?;
        if header.body_length() > self.max_frame_len {
            return Err(Error::FrameTooLarge {
                length: header.body_length(),
                max: self.max_frame_len,
            });
        }

        let mut body = vec![0u8; header.body_length()];
        self.inner.read_exact(&mut body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ConnectionLost("connection closed inside a frame body".to_string())
            } else {
                Error::from(e)
            }
        })?;

        Ok(Some(Frame::new(header.token, body)))
    }
}

/// Writes frames to a byte stream
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W> FrameWriter<W> {
    /// Wrap a byte stream
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<W> FrameWrite for FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode()?;
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Split a duplex byte stream into frame reader and writer halves
pub fn split<S>(stream: S, max_frame_len: usize) -> (FrameReader<ReadHalf<S>>, FrameWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read, write) = tokio::io::split(stream);
    (FrameReader::new(read, max_frame_len), FrameWriter::new(write))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_cross_a_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let (_, mut writer) = split(client, 1024);
        let (mut reader, _) = split(server, 1024);

        writer.write_frame(&Frame::new(3, &b"[2]"[..])).await.unwrap();
        writer.write_frame(&Frame::new(4, &b"[3]"[..])).await.unwrap();

        let first = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(first.token, 3);
        assert_eq!(&first.payload[..], b"[2]");
        let second = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(second.token, 4);
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let mut reader = FrameReader::new(server, 1024);
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_inside_frame() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(&[1, 0, 0, 0, 0, 0, 0, 0, 9, 0, 0, 0, b'[']).await.unwrap();
        drop(client);
        let mut reader = FrameReader::new(server, 1024);
        assert!(matches!(
            reader.read_frame().await,
            Err(Error::ConnectionLost(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0]).await.unwrap();
        let mut reader = FrameReader::new(server, 16);
        assert!(matches!(
            reader.read_frame().await,
            Err(Error::FrameTooLarge { length: 1024, max: 16 })
        ));
    }
}
