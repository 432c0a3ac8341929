//! Per-connection NNTP session (RFC 3977 reader commands)
//!
//! A [`Session`] is the state machine for one client: it owns the selected
//! group and current article pointer, executes parsed commands against the
//! shared [`NewsService`] and writes the responses. It is owned by exactly
//! one connection task and never shared, so it needs no locking.
//!
//! Storage calls run on tokio's blocking pool. If the client disconnects
//! while one is in flight the call still completes; only its result is
//! dropped.

mod connection;
mod io;
mod state;

use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};

pub use self::connection::Connection;
pub use self::io::{Line, LineReader, PostedArticle, ResponseWriter, dot_stuff, dot_unstuff};
pub use self::state::SessionState;
use crate::capabilities::Capabilities;
use crate::commands::{ArticlePart, ArticleRange, ArticleSpec, Command, ListKeyword, Selection};
use crate::error::{NntpError, Result};
use crate::groups::{GroupInfo, GroupStats};
use crate::overview::OVERVIEW_FMT;
use crate::response::{Response, codes};
use crate::service::NewsService;
use crate::validation::format_nntp_datetime;

const HELP_TEXT: &[&str] = &[
    "ARTICLE [number|<message-id>]",
    "AUTHINFO USER name|PASS password",
    "BODY [number|<message-id>]",
    "CAPABILITIES",
    "DATE",
    "GROUP newsgroup",
    "HDR field [range|<message-id>]",
    "HEAD [number|<message-id>]",
    "HELP",
    "LAST",
    "LIST [ACTIVE|ACTIVE.TIMES|NEWSGROUPS [wildmat]|OVERVIEW.FMT|HEADERS|SUBSCRIPTIONS]",
    "LISTGROUP [newsgroup [range]]",
    "MODE READER",
    "NEWGROUPS yyyymmdd hhmmss [GMT]",
    "NEWNEWS wildmat yyyymmdd hhmmss [GMT]",
    "NEXT",
    "OVER [range|<message-id>]",
    "POST",
    "QUIT",
    "STAT [number|<message-id>]",
    "XHDR field [range|<message-id>]",
    "XOVER [range]",
];

/// What the connection loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command
    Continue,
    /// A 340 was sent; read an article and hand it to [`Session::finish_post`]
    ReadArticle,
    /// QUIT was answered; close the connection
    Close,
}

/// One client's protocol state
#[derive(Debug)]
pub struct Session {
    service: Arc<NewsService>,
    state: SessionState,
    reader_mode: bool,
    pending_user: Option<String>,
    identity: Option<String>,
}

impl Session {
    pub fn new(service: Arc<NewsService>) -> Self {
        Self {
            service,
            state: SessionState::default(),
            reader_mode: false,
            pending_user: None,
            identity: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Name given with AUTHINFO, if the client identified itself
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Whether the client sent MODE READER
    pub fn reader_mode(&self) -> bool {
        self.reader_mode
    }

    /// Discard all session-local state
    pub fn close(&mut self) {
        self.state.close();
        self.pending_user = None;
    }

    /// Initial 200/201 greeting
    pub fn greeting(&self) -> Response {
        let host = &self.service.config().hostname;
        if self.service.posting_allowed() {
            Response::new(
                codes::READY_POSTING_ALLOWED,
                format!("{host} NNTP service ready, posting allowed"),
            )
        } else {
            Response::new(
                codes::READY_NO_POSTING,
                format!("{host} NNTP service ready, posting prohibited"),
            )
        }
    }

    /// Parse and execute one command line, writing its response
    ///
    /// Request failures are answered with a status line and the session
    /// continues. An error is only returned when the connection itself is
    /// unusable (the client went away or stopped reading mid-response).
    pub async fn execute_line<W: AsyncWrite + Unpin>(
        &mut self,
        line: &str,
        out: &mut ResponseWriter<W>,
    ) -> Result<Flow> {
        out.begin_command();
        let result = match Command::parse(line) {
            Ok(command) => {
                debug!("Executing {}", command.name());
                self.dispatch(command, out).await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(flow) => Ok(flow),
            // Part of a response already went out; the stream is out of sync
            Err(err) if out.has_written() => Err(err),
            Err(err) => {
                debug!("Command failed: {}", err);
                out.status(&Response::from_error(&err)).await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Complete a POST once the article has been read
    pub async fn finish_post<W: AsyncWrite + Unpin>(
        &mut self,
        article: PostedArticle,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        out.begin_command();
        let result = match article {
            PostedArticle::TooLarge => Err(NntpError::PostingFailed(
                "Article exceeds the size limit".to_string(),
            )),
            PostedArticle::Complete(raw) => blocking(&self.service, move |s| s.post(&raw)).await,
        };
        let response = match result {
            Ok(outcome) => {
                for (group, reason) in &outcome.rejected {
                    debug!("{} not filed in {}: {}", outcome.message_id, group, reason);
                }
                let mut text = format!("Article received {}", outcome.message_id);
                if !outcome.rejected.is_empty() {
                    let groups: Vec<&str> =
                        outcome.rejected.iter().map(|(group, _)| group.as_str()).collect();
                    text.push_str(&format!(" (not filed in {})", groups.join(", ")));
                }
                Response::new(codes::ARTICLE_POSTED, text)
            }
            Err(err) => {
                debug!("Post rejected: {}", err);
                Response::from_error(&err)
            }
        };
        out.status(&response).await
    }

    async fn dispatch<W: AsyncWrite + Unpin>(
        &mut self,
        command: Command,
        out: &mut ResponseWriter<W>,
    ) -> Result<Flow> {
        match command {
            Command::Capabilities => {
                let caps = Capabilities::reader(self.service.posting_allowed());
                let response = Response::new(codes::CAPABILITY_LIST, "Capability list follows");
                send_lines(&response, &caps.to_lines(), out).await?;
            }
            Command::ModeReader => {
                self.reader_mode = true;
                out.status(&self.greeting()).await?;
            }
            Command::Help => {
                let response = Response::new(codes::HELP_TEXT_FOLLOWS, "Help text follows");
                let lines: Vec<String> = HELP_TEXT.iter().map(|l| l.to_string()).collect();
                send_lines(&response, &lines, out).await?;
            }
            Command::Date => {
                let now = format_nntp_datetime(&Utc::now());
                out.status(&Response::new(codes::SERVER_DATE, now)).await?;
            }
            Command::Quit => {
                out.status(&Response::new(codes::CLOSING_CONNECTION, "Bye"))
                    .await?;
                self.close();
                return Ok(Flow::Close);
            }
            Command::Group(name) => {
                let stats = self.select(&name)?;
                let response = Response::new(
                    codes::GROUP_SELECTED,
                    format!("{} {} {} {}", stats.count, stats.low, stats.high, name),
                );
                out.status(&response).await?;
            }
            Command::ListGroup { group, range } => self.list_group(group, range, out).await?,
            Command::Next => self.step(true, out).await?,
            Command::Last => self.step(false, out).await?,
            Command::Retrieve { part, spec } => self.retrieve(part, spec, out).await?,
            Command::Post => {
                if !self.service.posting_allowed() {
                    return Err(NntpError::PostingNotPermitted);
                }
                let response = Response::new(
                    codes::SEND_ARTICLE,
                    "Send article to be posted; end with <CR-LF>.<CR-LF>",
                );
                out.status(&response).await?;
                return Ok(Flow::ReadArticle);
            }
            Command::List(keyword) => self.list(keyword, out).await?,
            Command::Over(target) => self.over(target, out).await?,
            Command::Hdr {
                field,
                target,
                legacy,
            } => self.hdr(field, target, legacy, out).await?,
            Command::NewGroups(since) => {
                let lines: Vec<String> = self
                    .service
                    .new_groups(since)
                    .iter()
                    .map(|(info, stats)| self.active_line(info, stats))
                    .collect();
                let response = Response::new(
                    codes::NEW_NEWSGROUPS_FOLLOW,
                    "List of new newsgroups follows",
                );
                send_lines(&response, &lines, out).await?;
            }
            Command::NewNews { wildmat, since } => {
                let ids = self.service.new_news(&wildmat, since)?;
                let response = Response::new(
                    codes::NEW_ARTICLE_LIST_FOLLOWS,
                    "List of new articles follows",
                );
                send_lines(&response, &ids, out).await?;
            }
            Command::AuthInfoUser(user) => {
                if self.identity.is_some() {
                    return Err(NntpError::Unsupported("Re-authentication".to_string()));
                }
                self.pending_user = Some(user);
                out.status(&Response::new(codes::AUTH_CONTINUE, "Password required"))
                    .await?;
            }
            Command::AuthInfoPass(_) => {
                let response = match self.pending_user.take() {
                    Some(user) => {
                        info!("Client identified as {}", user);
                        self.identity = Some(user);
                        Response::new(codes::AUTH_ACCEPTED, "Authentication accepted")
                    }
                    None => Response::new(
                        codes::AUTH_OUT_OF_SEQUENCE,
                        "Authentication commands issued out of sequence",
                    ),
                };
                out.status(&response).await?;
            }
            Command::Unavailable(name) => return Err(NntpError::Unsupported(name)),
        }
        Ok(Flow::Continue)
    }

    /// Select a group and reset the pointer to its first article
    fn select(&mut self, name: &str) -> Result<GroupStats> {
        let stats = self.service.index().stats(name)?;
        self.state.select(name, (stats.count > 0).then_some(stats.low));
        debug!("Selected {} ({} articles)", name, stats.count);
        Ok(stats)
    }

    async fn list_group<W: AsyncWrite + Unpin>(
        &mut self,
        group: Option<String>,
        range: Option<ArticleRange>,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let (name, stats) = match group {
            Some(name) => {
                let stats = self.select(&name)?;
                (name, stats)
            }
            None => {
                let name = self.state.require_group()?.to_string();
                let stats = self.service.index().stats(&name)?;
                (name, stats)
            }
        };
        let (mut low, high) = match range {
            Some(range) => range.bounds(stats.high),
            None => (stats.low, stats.high),
        };

        let response = Response::new(
            codes::GROUP_SELECTED,
            format!(
                "{} {} {} {} list follows",
                stats.count, stats.low, stats.high, name
            ),
        );
        out.begin(&response).await?;

        let limit = self.service.config().batch_size.max(1);
        while low <= high {
            let entries = match self.service.index().list_batch(&name, low, high, limit) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("LISTGROUP {} cut short: {}", name, err);
                    break;
                }
            };
            let Some(&(last, _)) = entries.last() else {
                break;
            };
            for (number, _) in &entries {
                out.text(&number.to_string()).await?;
            }
            out.flush().await?;
            if last >= high {
                break;
            }
            low = last + 1;
        }
        out.end().await
    }

    /// NEXT (`forward`) or LAST
    async fn step<W: AsyncWrite + Unpin>(
        &mut self,
        forward: bool,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let (group, current) = self.state.require_current()?;
        let (number, message_id) = if forward {
            self.service
                .index()
                .next(group, current)?
                .ok_or(NntpError::NoNextArticle)?
        } else {
            self.service
                .index()
                .previous(group, current)?
                .ok_or(NntpError::NoPreviousArticle)?
        };
        self.state.set_current(number);
        let response = Response::new(
            codes::ARTICLE_STAT,
            format!("{number} {message_id} retrieved"),
        );
        out.status(&response).await
    }

    async fn retrieve<W: AsyncWrite + Unpin>(
        &mut self,
        part: ArticlePart,
        spec: ArticleSpec,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let (number, article) = match spec {
            ArticleSpec::MessageId(id) => {
                let article = blocking(&self.service, move |s| s.article(&id)).await?;
                (0, article)
            }
            ArticleSpec::Current => {
                let (group, number) = self.state.require_current()?;
                let group = group.to_string();
                let article = blocking(&self.service, move |s| {
                    s.article_by_number(&group, number)
                })
                .await
                .map_err(current_missing)?;
                (number, article)
            }
            ArticleSpec::Number(number) => {
                let group = self.state.require_group()?.to_string();
                let article = blocking(&self.service, move |s| {
                    s.article_by_number(&group, number)
                })
                .await?;
                self.state.set_current(number);
                (number, article)
            }
        };

        let (code, what) = match part {
            ArticlePart::Whole => (codes::ARTICLE_FOLLOWS, "article"),
            ArticlePart::Head => (codes::HEAD_FOLLOWS, "head"),
            ArticlePart::Body => (codes::BODY_FOLLOWS, "body"),
            ArticlePart::Stat => (codes::ARTICLE_STAT, "status"),
        };
        let response = Response::new(code, format!("{number} {} {what}", article.message_id));

        if part == ArticlePart::Stat {
            return out.status(&response).await;
        }
        out.begin(&response).await?;
        if matches!(part, ArticlePart::Whole | ArticlePart::Head) {
            out.block(&article.headers.to_bytes()).await?;
        }
        if part == ArticlePart::Whole {
            out.line(b"").await?;
        }
        if matches!(part, ArticlePart::Whole | ArticlePart::Body) {
            for line in article.body_lines() {
                out.line(line).await?;
            }
        }
        out.end().await
    }

    fn active_line(&self, info: &GroupInfo, stats: &GroupStats) -> String {
        let flag = if info.posting_allowed && self.service.posting_allowed() {
            'y'
        } else {
            'n'
        };
        format!("{} {} {} {}", info.name, stats.high, stats.low, flag)
    }

    async fn list<W: AsyncWrite + Unpin>(
        &mut self,
        keyword: ListKeyword,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let lines: Vec<String> = match keyword {
            ListKeyword::Active(wildmat) => self
                .service
                .list_groups(&wildmat)
                .iter()
                .map(|(info, stats)| self.active_line(info, stats))
                .collect(),
            ListKeyword::ActiveTimes(wildmat) => {
                let creator = format!("news@{}", self.service.config().hostname);
                self.service
                    .list_groups(&wildmat)
                    .iter()
                    .map(|(info, _)| {
                        format!("{} {} {}", info.name, info.created.timestamp(), creator)
                    })
                    .collect()
            }
            ListKeyword::Newsgroups(wildmat) => self
                .service
                .list_groups(&wildmat)
                .iter()
                .map(|(info, _)| format!("{}\t{}", info.name, info.description))
                .collect(),
            ListKeyword::OverviewFmt => OVERVIEW_FMT.iter().map(|f| f.to_string()).collect(),
            ListKeyword::Headers => [":", ":bytes", ":lines"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            ListKeyword::Subscriptions => self.service.config().subscriptions.clone(),
            ListKeyword::Unsupported(name) => {
                let response = Response::new(
                    codes::FEATURE_NOT_SUPPORTED,
                    format!("LIST {name} not supported"),
                );
                return out.status(&response).await;
            }
        };
        let response = Response::new(codes::LIST_INFORMATION_FOLLOWS, "Information follows");
        send_lines(&response, &lines, out).await
    }

    async fn over<W: AsyncWrite + Unpin>(
        &mut self,
        target: Selection,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let response = Response::new(codes::OVERVIEW_INFO_FOLLOWS, "Overview information follows");
        match target {
            Selection::MessageId(id) => {
                let row = blocking(&self.service, move |s| s.overview_by_message_id(&id)).await?;
                send_lines(&response, &[row.to_string()], out).await
            }
            Selection::Current => {
                let (group, number) = self.state.require_current()?;
                let group = group.to_string();
                let row = blocking(&self.service, move |s| s.overview().get(&group, number))
                    .await
                    .map_err(current_missing)?;
                send_lines(&response, &[row.to_string()], out).await
            }
            Selection::Range(range) => {
                let group = self.state.require_group()?.to_string();
                let (low, high) = range.bounds(self.service.index().stats(&group)?.high);
                self.stream_range(group, low, high, &response, out, |s, group, low, high, limit| {
                    let (rows, last) = s.overview().get_batch(group, low, high, limit)?;
                    Ok((rows.iter().map(|row| row.to_string()).collect(), last))
                })
                .await
            }
        }
    }

    async fn hdr<W: AsyncWrite + Unpin>(
        &mut self,
        field: String,
        target: Selection,
        legacy: bool,
        out: &mut ResponseWriter<W>,
    ) -> Result<()> {
        let code = if legacy {
            codes::HEAD_FOLLOWS
        } else {
            codes::HEADERS_FOLLOW
        };
        let response = Response::new(code, "Headers follow");
        match target {
            Selection::MessageId(id) => {
                let lookup = id.clone();
                let value = blocking(&self.service, move |s| {
                    s.header_by_message_id(&lookup, &field)
                })
                .await?;
                // XHDR keys message-id lookups by the id itself
                let key = if legacy { id } else { "0".to_string() };
                send_lines(&response, &[format!("{key} {value}")], out).await
            }
            Selection::Current => {
                let (group, number) = self.state.require_current()?;
                let group = group.to_string();
                let (values, _) = blocking(&self.service, move |s| {
                    s.header_batch(&group, &field, number, number, 1)
                })
                .await?;
                let (number, value) = values
                    .into_iter()
                    .next()
                    .ok_or(NntpError::NoCurrentArticle)?;
                send_lines(&response, &[format!("{number} {value}")], out).await
            }
            Selection::Range(range) => {
                let group = self.state.require_group()?.to_string();
                let (low, high) = range.bounds(self.service.index().stats(&group)?.high);
                self.stream_range(
                    group,
                    low,
                    high,
                    &response,
                    out,
                    move |s, group, low, high, limit| {
                        let (values, last) = s.header_batch(group, &field, low, high, limit)?;
                        let lines = values
                            .into_iter()
                            .map(|(number, value)| format!("{number} {value}"))
                            .collect();
                        Ok((lines, last))
                    },
                )
                .await
            }
        }
    }

    /// Send a range listing in batches of `batch_size` index entries
    ///
    /// The status line goes out with the first non-empty batch; a range with
    /// no articles is answered 423. Once the status is sent, a storage
    /// failure ends the listing early instead of corrupting the stream.
    async fn stream_range<W, F>(
        &self,
        group: String,
        mut low: u64,
        high: u64,
        response: &Response,
        out: &mut ResponseWriter<W>,
        fetch: F,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        F: Fn(&NewsService, &str, u64, u64, usize) -> Result<(Vec<String>, Option<u64>)>
            + Clone
            + Send
            + 'static,
    {
        let limit = self.service.config().batch_size.max(1);
        let first = low;
        let mut started = false;

        while low <= high {
            let batch = {
                let fetch = fetch.clone();
                let group = group.clone();
                blocking(&self.service, move |s| fetch(s, &group, low, high, limit)).await
            };
            let (lines, last) = match batch {
                Ok(batch) => batch,
                Err(err) if !started => return Err(err),
                Err(err) => {
                    warn!("Listing of {} cut short: {}", group, err);
                    break;
                }
            };
            let Some(last) = last else {
                break;
            };

            if !started && !lines.is_empty() {
                out.begin(response).await?;
                started = true;
            }
            for line in &lines {
                out.text(line).await?;
            }
            if started {
                out.flush().await?;
            }
            if last >= high {
                break;
            }
            low = last + 1;
        }

        if !started {
            return Err(NntpError::NoSuchArticleNumber(first));
        }
        out.end().await
    }
}

/// Run a storage call on the blocking pool
async fn blocking<T, F>(service: &Arc<NewsService>, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&NewsService) -> Result<T> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || task(&service))
        .await
        .map_err(|err| NntpError::Other(format!("Storage task failed: {err}")))?
}

/// The current number no longer maps to an article
fn current_missing(err: NntpError) -> NntpError {
    match err {
        NntpError::NoSuchArticleNumber(_) => NntpError::NoCurrentArticle,
        err => err,
    }
}

async fn send_lines<W: AsyncWrite + Unpin>(
    response: &Response,
    lines: &[String],
    out: &mut ResponseWriter<W>,
) -> Result<()> {
    out.begin(response).await?;
    for line in lines {
        out.text(line).await?;
    }
    out.end().await
}
