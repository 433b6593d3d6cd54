//! Chunked transport and the command/response exchange loop.
//!
//! Replies accumulate a chunk at a time and are tested against the framing
//! predicate until the tagged status line arrives. A zero-byte read means
//! the peer closed the connection; an explicitly-retryable failure is
//! retried up to a configured bound; everything else is fatal. There is no
//! time-based receive timeout — a silent peer blocks the caller.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};
use crate::command::Tag;
use crate::parser::frame;
use crate::{Error, Result};

/// Chunked stream wrapper owning the reply accumulation loop.
///
/// Exactly one command is ever in flight: `exchange` takes `&mut self` and
/// does not return until the reply is complete or the connection is dead.
pub struct FramedStream<S> {
    stream: S,
    chunk: BytesMut,
    chunk_size: usize,
    max_retries: u32,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a framed stream with default chunk size and retry bound.
    pub fn new(stream: S) -> Self {
        Self::with_limits(stream, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES)
    }

    /// Creates a framed stream with explicit chunk size and retry bound.
    pub fn with_limits(stream: S, chunk_size: usize, max_retries: u32) -> Self {
        Self {
            stream,
            chunk: BytesMut::with_capacity(chunk_size),
            chunk_size,
            max_retries,
        }
    }

    /// Performs one read of up to the configured chunk size.
    ///
    /// Retries transient failures up to the attempt bound; a zero-byte read
    /// is the peer closing the connection and is always fatal.
    pub async fn read_chunk(&mut self) -> Result<&[u8]> {
        let mut attempt = 1;
        loop {
            self.chunk.resize(self.chunk_size, 0);
            match self.stream.read(&mut self.chunk).await {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    self.chunk.truncate(n);
                    return Ok(&self.chunk);
                }
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, "retrying transient read failure");
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Writes a full command line, retrying transient failures.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.stream.write_all(data).await {
                Ok(()) => break,
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, "retrying transient write failure");
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
        self.stream.flush().await?;
        Ok(())
    }

    /// Sends one tagged command and accumulates its reply until complete.
    ///
    /// The returned buffer is the whole reply, untagged lines included. The
    /// caller validates the terminal status line and advances the tag only
    /// after that.
    pub async fn exchange(&mut self, tag: Tag, command: &[u8]) -> Result<Vec<u8>> {
        self.write_command(command).await?;

        let mut reply = Vec::new();
        loop {
            let chunk = self.read_chunk().await?;
            reply.extend_from_slice(chunk);
            if frame::is_complete(&reply, tag) {
                tracing::debug!(%tag, bytes = reply.len(), "reply complete");
                return Ok(reply);
            }
        }
    }

    /// Reads the server greeting: chunks until the buffer ends with CRLF.
    pub async fn read_greeting(&mut self) -> Result<Vec<u8>> {
        let mut greeting = Vec::new();
        loop {
            let chunk = self.read_chunk().await?;
            greeting.extend_from_slice(chunk);
            if greeting.ends_with(b"\r\n") {
                return Ok(greeting);
            }
        }
    }

    /// Gets a reference to the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Gets a mutable reference to the underlying stream.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consumes the framed stream and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Failures the underlying transport explicitly reports as retryable.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    fn interrupted() -> io::Error {
        io::Error::new(io::ErrorKind::Interrupted, "try again")
    }

    #[tokio::test]
    async fn test_read_greeting_single_chunk() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let greeting = framed.read_greeting().await.unwrap();
        assert_eq!(greeting, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_greeting_across_chunks() {
        let mock = Builder::new().read(b"* OK re").read(b"ady\r\n").build();
        let mut framed = FramedStream::new(mock);

        let greeting = framed.read_greeting().await.unwrap();
        assert_eq!(greeting, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_exchange_completes_on_tagged_line() {
        let mock = Builder::new()
            .write(b"5 logout\r\n")
            .read(b"* BYE see you\r\n")
            .read(b"5 OK bye\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let reply = framed.exchange(Tag::new(5), b"5 logout\r\n").await.unwrap();
        assert_eq!(reply, b"* BYE see you\r\n5 OK bye\r\n");
    }

    #[tokio::test]
    async fn test_exchange_keeps_reading_until_tag_matches() {
        // The untagged line alone must not complete the reply.
        let mock = Builder::new()
            .write(b"1 select inbox\r\n")
            .read(b"* 42 EXISTS\r\n")
            .read(b"1 OK selected\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let reply = framed
            .exchange(Tag::new(1), b"1 select inbox\r\n")
            .await
            .unwrap();
        assert_eq!(reply, b"* 42 EXISTS\r\n1 OK selected\r\n");
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let mock = Builder::new()
            .read_error(interrupted())
            .read_error(interrupted())
            .read(b"* OK ready\r\n")
            .build();
        let mut framed = FramedStream::with_limits(mock, 1500, 3);

        let greeting = framed.read_greeting().await.unwrap();
        assert_eq!(greeting, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_retry_bound_is_enforced() {
        let mock = Builder::new()
            .read_error(interrupted())
            .read_error(interrupted())
            .read_error(interrupted())
            .build();
        let mut framed = FramedStream::with_limits(mock, 1500, 3);

        let err = framed.read_chunk().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_non_retryable_read_failure_is_immediate() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut framed = FramedStream::with_limits(mock, 1500, 8);

        let err = framed.read_chunk().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_zero_byte_read_is_connection_closed() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut framed = FramedStream::new(client);

        let err = framed.read_chunk().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_transient_write_failures_are_retried() {
        let mock = Builder::new()
            .write_error(interrupted())
            .write(b"0 logout\r\n")
            .build();
        let mut framed = FramedStream::with_limits(mock, 1500, 2);

        framed.write_command(b"0 logout\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_write_retry_bound_is_enforced() {
        let mock = Builder::new()
            .write_error(interrupted())
            .write_error(interrupted())
            .build();
        let mut framed = FramedStream::with_limits(mock, 1500, 2);

        let err = framed.write_command(b"0 logout\r\n").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_small_chunk_size_makes_progress() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::with_limits(mock, 4, 8);

        let greeting = framed.read_greeting().await.unwrap();
        assert_eq!(greeting, b"* OK ready\r\n");
    }
}
