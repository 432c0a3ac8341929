//! Shared harness: a real `Connection` driven over an in-memory duplex stream
#![allow(dead_code)]

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use nntp_server::{
    Article, ArticleStore, Connection, GroupConfig, GroupIndex, NewsService, NntpError,
    ServerConfig,
};

/// Service with in-memory storage and the given groups (posting allowed)
pub fn memory_service(groups: &[&str]) -> Arc<NewsService> {
    service_with(groups.iter().fold(ServerConfig::in_memory(), |config, name| {
        config.with_group(GroupConfig::new(*name))
    }))
}

pub fn service_with(config: ServerConfig) -> Arc<NewsService> {
    Arc::new(NewsService::open(config.with_hostname("news.test")).unwrap())
}

/// Article store on a disk that has gone bad: every call fails with `Io`
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn failure(message_id: &str) -> NntpError {
        NntpError::Io(std::io::Error::other(format!(
            "I/O error reading {message_id}"
        )))
    }
}

impl ArticleStore for FailingStore {
    fn put(&self, article: &Article) -> nntp_server::Result<()> {
        Err(Self::failure(&article.message_id))
    }

    fn get(&self, message_id: &str) -> nntp_server::Result<Arc<Article>> {
        Err(Self::failure(message_id))
    }

    fn delete(&self, message_id: &str) -> nntp_server::Result<()> {
        Err(Self::failure(message_id))
    }

    fn contains(&self, message_id: &str) -> nntp_server::Result<bool> {
        Err(Self::failure(message_id))
    }
}

/// Service over a [`FailingStore`] whose index lists `ids` in `group`
pub fn failing_service(group: &str, ids: &[&str]) -> Arc<NewsService> {
    let index = GroupIndex::in_memory();
    index.create_group(group, true, "").unwrap();
    for id in ids {
        index.post(group, id).unwrap();
    }
    let config = ServerConfig::in_memory().with_hostname("news.test");
    Arc::new(NewsService::new(
        config,
        Arc::new(FailingStore),
        Arc::new(index),
    ))
}

/// Raw article text with CRLF line endings
pub fn article(id: &str, groups: &str, subject: &str, body: &str) -> String {
    let mut text = format!(
        "From: tester@example.com\r\nSubject: {subject}\r\nNewsgroups: {groups}\r\nMessage-ID: {id}\r\n\r\n"
    );
    for line in body.lines() {
        text.push_str(line);
        text.push_str("\r\n");
    }
    text
}

/// Post directly through the service, bypassing the wire
pub fn seed(service: &NewsService, id: &str, groups: &str, subject: &str) {
    service
        .post(article(id, groups, subject, "seeded body").as_bytes())
        .unwrap();
}

/// Client end of a connection
pub struct TestClient {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    task: JoinHandle<nntp_server::Result<()>>,
    /// Greeting status line
    pub greeting: (u16, String),
}

impl TestClient {
    /// Open a connection and read the greeting
    pub async fn connect(service: Arc<NewsService>) -> Self {
        let (client, server) = tokio::io::duplex(256 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let task = tokio::spawn(Connection::new(server_read, server_write, service).run());

        let (client_read, client_write) = tokio::io::split(client);
        let mut client = Self {
            reader: BufReader::new(client_read),
            writer: client_write,
            task,
            greeting: (0, String::new()),
        };
        client.greeting = client.status().await;
        client
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Read one raw line without its terminator; `None` at EOF
    pub async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        if n == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read a status line as (code, message)
    pub async fn status(&mut self) -> (u16, String) {
        let line = self.read_line().await.expect("connection closed");
        let (code, message) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        (code.parse().unwrap(), message.to_string())
    }

    /// Read multi-line data up to the terminator, removing dot-stuffing
    pub async fn data(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await.expect("connection closed");
            if line == "." {
                return lines;
            }
            match line.strip_prefix("..") {
                Some(rest) => lines.push(format!(".{rest}")),
                None => lines.push(line),
            }
        }
    }

    /// Send a single-line command and read its status
    pub async fn command(&mut self, line: &str) -> (u16, String) {
        self.send(line).await;
        self.status().await
    }

    /// Send a command whose success response is multi-line
    ///
    /// Data lines are read only for the given success code.
    pub async fn multi(&mut self, line: &str, success: u16) -> (u16, Vec<String>) {
        let (code, _) = self.command(line).await;
        if code == success {
            (code, self.data().await)
        } else {
            (code, Vec::new())
        }
    }

    /// POST an article; returns the 340 code and the final status
    pub async fn post(&mut self, article: &str) -> (u16, (u16, String)) {
        let (code, message) = self.command("POST").await;
        if code != 340 {
            return (code, (code, message));
        }
        let body = article.strip_suffix("\r\n").unwrap_or(article);
        for line in body.split("\r\n") {
            if line.starts_with('.') {
                self.writer.write_all(b".").await.unwrap();
            }
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\r\n").await.unwrap();
        }
        self.writer.write_all(b".\r\n").await.unwrap();
        self.writer.flush().await.unwrap();
        (code, self.status().await)
    }

    /// Send QUIT and wait for the connection task to finish
    pub async fn quit(mut self) -> nntp_server::Result<()> {
        let (code, _) = self.command("QUIT").await;
        assert_eq!(code, 205);
        assert_eq!(self.read_line().await, None);
        self.task.await.unwrap()
    }

    /// Close the client side and wait for the connection task
    pub async fn hang_up(self) -> nntp_server::Result<()> {
        drop(self.writer);
        drop(self.reader);
        self.task.await.unwrap()
    }
}
