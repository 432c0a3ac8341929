//! nntpd: stand-alone NNTP news server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nntp_server::{NewsService, NntpServer, ServerConfig, StorageBackend};

/// NNTP news server with durable article storage
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config file)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Storage root directory (overrides config file)
    #[arg(short, long, conflicts_with = "memory")]
    storage: Option<PathBuf>,

    /// Keep articles in memory only
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nntp_server=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run(args: Args) -> nntp_server::Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ServerConfig::from_json_file(path)?
        }
        None => ServerConfig::default(),
    };

    // CLI overrides config
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(root) = args.storage {
        config.storage = StorageBackend::File { root };
    }
    if args.memory {
        config.storage = StorageBackend::Memory;
    }

    let service = Arc::new(NewsService::open(config)?);
    let server = NntpServer::bind(service).await?;
    info!(
        "nntpd {} serving on {}",
        nntp_server::VERSION,
        server.local_addr()?
    );
    server.serve_with_shutdown(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
