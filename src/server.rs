//! TCP listener and connection dispatch
//!
//! One tokio task per accepted connection. Connections beyond
//! `max_connections` get a 400 and are closed immediately.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{NntpError, Result};
use crate::ratelimit::{ConnectionLimiter, ConnectionPermit};
use crate::response::{Response, codes};
use crate::service::NewsService;
use crate::session::Connection;

/// NNTP server bound to a TCP address
#[derive(Debug)]
pub struct NntpServer {
    listener: TcpListener,
    service: Arc<NewsService>,
    limiter: ConnectionLimiter,
}

impl NntpServer {
    /// Bind to the address in the service's configuration
    pub async fn bind(service: Arc<NewsService>) -> Result<Self> {
        let addr = service.config().listen;
        Self::bind_to(addr, service).await
    }

    /// Bind to an explicit address (port 0 picks a free port)
    pub async fn bind_to(addr: SocketAddr, service: Arc<NewsService>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let limiter = ConnectionLimiter::new(service.config().max_connections);
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            service,
            limiter,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Connection limiter shared by all connections
    pub fn limiter(&self) -> &ConnectionLimiter {
        &self.limiter
    }

    /// Accept connections forever
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Connections already running are left to finish on their own.
    pub async fn serve_with_shutdown(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer),
                    // Per-connection accept failures (e.g. EMFILE) must not stop the server
                    Err(err) => warn!("Accept failed: {}", err),
                },
            }
        }
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        let span = info_span!("connection", %peer);
        match self.limiter.try_acquire() {
            Some(permit) => {
                let service = Arc::clone(&self.service);
                tokio::spawn(handle_connection(stream, service, permit).instrument(span));
            }
            None => {
                tokio::spawn(refuse_connection(stream, self.limiter.max_connections()).instrument(span));
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, service: Arc<NewsService>, _permit: ConnectionPermit) {
    info!("Client connected");
    if let Err(err) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY: {}", err);
    }
    let (reader, writer) = stream.into_split();
    match Connection::new(reader, writer, service).run().await {
        Ok(()) | Err(NntpError::ConnectionClosed) => info!("Client disconnected"),
        Err(err) => info!("Client disconnected: {}", err),
    }
}

async fn refuse_connection(mut stream: TcpStream, max: usize) {
    warn!("Refusing connection: {} clients already connected", max);
    let response = Response::new(
        codes::SERVICE_UNAVAILABLE,
        "Too many connections, try again later",
    );
    let _ = stream.write_all(response.to_wire().as_bytes()).await;
    let _ = stream.shutdown().await;
}
