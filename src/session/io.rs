//! Wire I/O for a client session
//!
//! This module provides the I/O primitives the session state machine is
//! built on:
//! - Bounded command line reading (a client cannot make us buffer an
//!   unbounded line)
//! - POST article reading with dot-unstuffing and a size cap
//! - Status lines and dot-stuffed multi-line responses
//! - Write timeouts so a client that stops draining responses is dropped

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::time::timeout;
use tracing::trace;

use crate::error::{NntpError, Result};
use crate::response::Response;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Add NNTP byte-stuffing to a line (a leading "." becomes "..")
pub fn dot_stuff(line: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    if line.starts_with(b".") {
        let mut stuffed = Vec::with_capacity(line.len() + 1);
        stuffed.push(b'.');
        stuffed.extend_from_slice(line);
        stuffed.into()
    } else {
        line.into()
    }
}

/// Strip NNTP byte-stuffing from a line (leading ".." becomes ".")
pub fn dot_unstuff(line: &[u8]) -> &[u8] {
    if line.starts_with(b"..") {
        &line[1..]
    } else {
        line
    }
}

/// Result of reading one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete line, terminator removed
    Complete(Vec<u8>),
    /// A line longer than the limit; its bytes were discarded
    TooLong,
    /// The peer closed the stream
    Eof,
}

/// Article received after a 340 response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostedArticle {
    /// Article bytes, dot-unstuffed, lines CRLF-terminated
    Complete(Vec<u8>),
    /// The article exceeded the size limit and was drained
    TooLarge,
}

/// Line reader with a fixed upper bound on line length
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    max_line_length: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R, max_line_length: usize) -> Self {
        Self {
            inner,
            max_line_length,
        }
    }

    /// Read one line of at most `limit` bytes (terminator excluded)
    ///
    /// An overlong line is consumed through its terminator and reported as
    /// `TooLong`. A partial line cut off by EOF is dropped.
    async fn read_limited(&mut self, limit: usize) -> Result<Line> {
        let mut line = Vec::new();
        let mut overflow = false;

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                if !line.is_empty() || overflow {
                    trace!("Dropping unterminated line at EOF");
                }
                return Ok(Line::Eof);
            }

            let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..=pos], true),
                None => (available, false),
            };
            let taken = chunk.len();
            // Allow room for the CRLF terminator on top of the limit
            if !overflow && line.len() + taken <= limit + 2 {
                line.extend_from_slice(chunk);
            } else {
                overflow = true;
                line.clear();
            }
            self.inner.consume(taken);

            if done {
                break;
            }
        }

        if overflow {
            return Ok(Line::TooLong);
        }
        if line.ends_with(b"\n") {
            line.pop();
        }
        if line.ends_with(b"\r") {
            line.pop();
        }
        if line.len() > limit {
            return Ok(Line::TooLong);
        }
        Ok(Line::Complete(line))
    }

    /// Read one command line
    pub async fn read_line(&mut self) -> Result<Line> {
        let line = self.read_limited(self.max_line_length).await?;
        if let Line::Complete(bytes) = &line {
            trace!("Received: {}", String::from_utf8_lossy(bytes));
        }
        Ok(line)
    }

    /// Read a posted article up to the terminating "." line
    ///
    /// Lines are dot-unstuffed and re-terminated with CRLF. Once the article
    /// grows past `max_bytes` the rest is read and discarded so the session
    /// stays in sync with the client.
    ///
    /// `idle` bounds the wait for each line, not the whole article; a client
    /// silent for longer gets `NntpError::Timeout`.
    pub async fn read_article(
        &mut self,
        max_bytes: usize,
        idle: Duration,
    ) -> Result<PostedArticle> {
        let mut article = Vec::new();
        let mut too_large = false;

        loop {
            let line = timeout(idle, self.read_limited(max_bytes))
                .await
                .map_err(|_| NntpError::Timeout)??;
            let line = match line {
                Line::Complete(line) => line,
                Line::TooLong => {
                    too_large = true;
                    continue;
                }
                Line::Eof => return Err(NntpError::ConnectionClosed),
            };
            if line == b"." {
                break;
            }
            if too_large {
                continue;
            }

            let line = dot_unstuff(&line);
            if article.len() + line.len() + 2 > max_bytes {
                too_large = true;
                article = Vec::new();
                continue;
            }
            article.extend_from_slice(line);
            article.extend_from_slice(b"\r\n");
        }

        if too_large {
            return Ok(PostedArticle::TooLarge);
        }
        trace!("Received article of {} bytes", article.len());
        Ok(PostedArticle::Complete(article))
    }
}

/// Buffered response writer with a per-write timeout
#[derive(Debug)]
pub struct ResponseWriter<W: AsyncWrite> {
    inner: BufWriter<W>,
    write_timeout: Duration,
    /// Whether anything was written since the last `begin_command`
    written: bool,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(inner: W, write_timeout: Duration) -> Self {
        Self {
            inner: BufWriter::with_capacity(WRITE_BUFFER_SIZE, inner),
            write_timeout,
            written: false,
        }
    }

    /// Mark the start of a new command's response
    pub fn begin_command(&mut self) {
        self.written = false;
    }

    /// Whether any part of the current response has been written
    pub fn has_written(&self) -> bool {
        self.written
    }

    async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.written = true;
        timeout(self.write_timeout, self.inner.write_all(bytes))
            .await
            .map_err(|_| NntpError::Timeout)??;
        Ok(())
    }

    /// Push buffered output to the client
    pub async fn flush(&mut self) -> Result<()> {
        timeout(self.write_timeout, self.inner.flush())
            .await
            .map_err(|_| NntpError::Timeout)??;
        Ok(())
    }

    /// Send a single-line response and flush
    pub async fn status(&mut self, response: &Response) -> Result<()> {
        self.begin(response).await?;
        self.flush().await
    }

    /// Write the status line of a multi-line response, without flushing
    pub async fn begin(&mut self, response: &Response) -> Result<()> {
        trace!("Sending: {} {}", response.code, response.message);
        self.write_raw(response.to_wire().as_bytes()).await
    }

    /// Write one data line, dot-stuffed and CRLF-terminated
    pub async fn line(&mut self, line: &[u8]) -> Result<()> {
        let stuffed = dot_stuff(line);
        self.write_raw(&stuffed).await?;
        self.write_raw(b"\r\n").await
    }

    /// Write one text data line
    pub async fn text(&mut self, line: &str) -> Result<()> {
        self.line(line.as_bytes()).await
    }

    /// Write a block of CRLF- or LF-separated lines, each dot-stuffed
    pub async fn block(&mut self, block: &[u8]) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        let block = block.strip_suffix(b"\n").unwrap_or(block);
        for line in block.split(|&b| b == b'\n') {
            self.line(line.strip_suffix(b"\r").unwrap_or(line)).await?;
        }
        Ok(())
    }

    /// Terminate a multi-line response and flush
    pub async fn end(&mut self) -> Result<()> {
        self.write_raw(b".\r\n").await?;
        self.flush().await
    }

    /// Flush and shut down the write side
    pub async fn shutdown(&mut self) -> Result<()> {
        self.flush().await?;
        timeout(self.write_timeout, self.inner.shutdown())
            .await
            .map_err(|_| NntpError::Timeout)??;
        Ok(())
    }
}
