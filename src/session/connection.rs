//! Command loop for one client connection

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::time::timeout;
use tracing::{debug, info};

use super::io::{Line, LineReader, ResponseWriter};
use super::{Flow, Session};
use crate::error::{NntpError, Result};
use crate::response::{Response, codes};
use crate::service::NewsService;

/// A client connection: reader, writer and the session driving them
///
/// Generic over the transport so tests can drive it through an in-memory
/// duplex stream.
#[derive(Debug)]
pub struct Connection<R, W: AsyncWrite> {
    reader: LineReader<BufReader<R>>,
    writer: ResponseWriter<W>,
    session: Session,
    idle_timeout: Duration,
    max_article_bytes: usize,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, service: Arc<NewsService>) -> Self {
        let config = service.config();
        let reader = LineReader::new(BufReader::new(reader), config.max_line_length);
        let writer = ResponseWriter::new(writer, config.write_timeout());
        let idle_timeout = config.idle_timeout();
        let max_article_bytes = config.max_article_bytes;
        Self {
            reader,
            writer,
            session: Session::new(service),
            idle_timeout,
            max_article_bytes,
        }
    }

    /// Greet the client and process commands until QUIT, EOF or a timeout
    ///
    /// An idle client is sent a 400 and disconnected. Errors returned here
    /// are transport failures; request failures are answered in-band.
    pub async fn run(mut self) -> Result<()> {
        let greeting = self.session.greeting();
        self.writer.status(&greeting).await?;

        let result = self.command_loop().await;
        self.session.close();
        // The peer may already be gone
        let _ = self.writer.shutdown().await;
        result
    }

    async fn command_loop(&mut self) -> Result<()> {
        loop {
            let line = match timeout(self.idle_timeout, self.reader.read_line()).await {
                Ok(line) => line?,
                Err(_) => return self.idle_disconnect().await,
            };

            let line = match line {
                Line::Complete(line) => line,
                Line::TooLong => {
                    self.writer
                        .status(&Response::new(
                            codes::COMMAND_SYNTAX_ERROR,
                            "Command line too long",
                        ))
                        .await?;
                    continue;
                }
                Line::Eof => {
                    debug!("Client closed the connection");
                    return Ok(());
                }
            };

            let text = String::from_utf8_lossy(&line);
            match self.session.execute_line(&text, &mut self.writer).await? {
                Flow::Continue => {}
                Flow::Close => {
                    info!("Client sent QUIT");
                    return Ok(());
                }
                Flow::ReadArticle => {
                    let article = match self
                        .reader
                        .read_article(self.max_article_bytes, self.idle_timeout)
                        .await
                    {
                        Ok(article) => article,
                        Err(NntpError::Timeout) => return self.idle_disconnect().await,
                        Err(err) => return Err(err),
                    };
                    self.session
                        .finish_post(article, &mut self.writer)
                        .await?;
                }
            }
        }
    }

    async fn idle_disconnect(&mut self) -> Result<()> {
        info!("Idle timeout after {:?}", self.idle_timeout);
        let _ = self
            .writer
            .status(&Response::from_error(&NntpError::Timeout))
            .await;
        Ok(())
    }
}
