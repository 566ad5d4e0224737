//! Line-oriented transport.
//!
//! Every protocol unit is one UTF-8 line. [`LineTransport`] is the seam the
//! handshake drivers and sessions talk through; [`LineStream`] implements it
//! over any tokio byte stream (TCP socket, in-memory duplex pipe).

use std::time::Duration;

use async_trait::async_trait;
use lineseal_proto::MAX_LINE_LENGTH;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufStream};

use crate::error::TransportError;

/// Reads and writes whole protocol lines.
#[async_trait]
pub trait LineTransport: Send {
    /// Read the next line, without its terminator.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection.
    async fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Write `line` followed by `\n` and flush.
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// Transport limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Longest accepted line, excluding the terminator
    pub max_line_length: usize,
    /// Give up on a read after this long. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { max_line_length: MAX_LINE_LENGTH, read_timeout: None }
    }
}

/// [`LineTransport`] over a buffered byte stream.
#[derive(Debug)]
pub struct LineStream<S> {
    stream: BufStream<S>,
    config: TransportConfig,
}

impl<S> LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap `stream` with default limits.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, TransportConfig::default())
    }

    /// Wrap `stream` with the given limits.
    pub fn with_config(stream: S, config: TransportConfig) -> Self {
        Self { stream: BufStream::new(stream), config }
    }

    async fn read_line_unbounded(&mut self) -> Result<Option<String>, TransportError> {
        let max = self.config.max_line_length;
        // Room for the line plus "\r\n"
        let limit = (max + 2) as u64;

        let mut buffer = Vec::new();
        let read = (&mut self.stream).take(limit).read_until(b'\n', &mut buffer).await?;
        if read == 0 {
            return Ok(None);
        }

        if buffer.last() == Some(&b'\n') {
            buffer.pop();
            if buffer.last() == Some(&b'\r') {
                buffer.pop();
            }
        }

        // Either the take limit cut the line off or the terminator was the
        // only thing that fit
        if buffer.len() > max {
            return Err(TransportError::LineTooLong { max });
        }

        String::from_utf8(buffer).map(Some).map_err(|_| TransportError::InvalidUtf8)
    }
}

#[async_trait]
impl<S> LineTransport for LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.config.read_timeout {
            Some(elapsed) => tokio::time::timeout(elapsed, self.read_line_unbounded())
                .await
                .map_err(|_| TransportError::Timeout { elapsed })?,
            None => self.read_line_unbounded().await,
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }
}
