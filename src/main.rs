use std::sync::Arc;

use rustyproxy::cache::CacheStore;
use rustyproxy::transaction;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let port = match parse_port(&args) {
        Ok(port) => port,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rustyproxy=info")),
        )
        .init();

    let cache = Arc::new(CacheStore::new());

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("failed to bind to port {port}: {err}");
            std::process::exit(1);
        }
    };

    info!(port, "rustyproxy listening");

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("failed to install SIGINT handler");

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((client, addr)) => {
                        debug!(%addr, "accepted connection");
                        let cache = cache.clone();
                        tokio::spawn(async move {
                            transaction::handle(client, cache).await;
                        });
                    }
                    Err(err) => {
                        warn!(%err, "failed to accept connection");
                    }
                }
            }
        }
    }
}

/// Parses the single positional `<port>` argument. Any other invocation
/// (missing or extra arguments, or a non-numeric port) is a usage error.
fn parse_port(args: &[String]) -> Result<u16, String> {
    let program = args.first().map(String::as_str).unwrap_or("rustyproxy");
    match args.len() {
        2 => args[1]
            .parse::<u16>()
            .map_err(|_| format!("usage: {program} <port>\n\"{}\" is not a valid port", args[1])),
        _ => Err(format!("usage: {program} <port>")),
    }
}
