//! JSON-RPC framing codec for LSP communication.
//!
//! LSP uses `Content-Length: N\r\n\r\n{json}` framing over stdin/stdout.
//! This module provides [`FrameReader`] and [`FrameWriter`] for async
//! reading and writing of framed JSON-RPC messages.

use std::num::ParseIntError;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (64 MiB) to prevent unbounded memory allocation.
///
/// Semantic token payloads for large files run into several megabytes, so
/// this is well above what a single full-document response needs.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// A malformed, truncated, or undeliverable frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value {value:?}")]
    InvalidContentLength {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Content-Length {length} exceeds maximum {max}", max = MAX_FRAME_BYTES)]
    Oversized { length: usize },
    #[error("unexpected EOF while reading headers")]
    EofInHeaders,
    #[error("stream ended before {expected}-byte frame body was complete")]
    TruncatedBody {
        expected: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing JSON-RPC frame")]
    InvalidJson(#[source] serde_json::Error),
    #[error("serializing JSON-RPC frame")]
    Serialize(#[source] serde_json::Error),
    #[error("{context}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FrameError {
    fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }
}

/// Reads JSON-RPC frames from an async reader.
///
/// Parses `Content-Length` headers and reads exactly that many bytes,
/// then deserializes the body as JSON.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next JSON-RPC frame.
    ///
    /// Returns `Ok(None)` on EOF (clean shutdown).
    /// Returns `Err` on malformed headers, truncated bodies or oversized frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, FrameError> {
        let content_length = match self.read_headers().await? {
            Some(len) => len,
            None => return Ok(None), // EOF
        };

        if content_length > MAX_FRAME_BYTES {
            return Err(FrameError::Oversized {
                length: content_length,
            });
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .await
            .map_err(|source| FrameError::TruncatedBody {
                expected: content_length,
                source,
            })?;

        let value = serde_json::from_slice(&body).map_err(FrameError::InvalidJson)?;
        Ok(Some(value))
    }

    /// Parse headers until the empty line separator.
    ///
    /// Returns the `Content-Length` value, or `None` on EOF.
    async fn read_headers(&mut self) -> Result<Option<usize>, FrameError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(FrameError::io("reading header line"))?;

            if bytes_read == 0 {
                // EOF is only clean before the first header byte.
                if !saw_any_header_bytes {
                    return Ok(None);
                }
                return Err(FrameError::EofInHeaders);
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':')
                && key.trim().eq_ignore_ascii_case("Content-Length")
            {
                let value = value.trim();
                let len = value
                    .parse()
                    .map_err(|source| FrameError::InvalidContentLength {
                        value: value.to_string(),
                        source,
                    })?;
                content_length = Some(len);
            }
            // Other headers (Content-Type, lines without a colon) are ignored.
        }

        content_length
            .map(Some)
            .ok_or(FrameError::MissingContentLength)
    }
}

/// Writes JSON-RPC frames to an async writer.
///
/// Serializes JSON and prepends the `Content-Length` header.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a JSON-RPC frame with `Content-Length` header.
    ///
    /// Header and body go out in a single write so a frame is never
    /// interleaved with another.
    pub async fn write_frame<T: serde::Serialize>(&mut self, msg: &T) -> Result<(), FrameError> {
        let body = serde_json::to_vec(msg).map_err(FrameError::Serialize)?;
        let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        frame.extend_from_slice(&body);

        self.writer
            .write_all(&frame)
            .await
            .map_err(FrameError::io("writing frame"))?;
        self.writer
            .flush()
            .await
            .map_err(FrameError::io("flushing frame"))?;

        Ok(())
    }
}
