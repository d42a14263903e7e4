//! Rollbook Server Binary
//!
//! Starts the TCP server for Rollbook.

use std::sync::Arc;

use clap::Parser;
use rollbook::network::Server;
use rollbook::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// Rollbook Server
#[derive(Parser, Debug)]
#[command(name = "rollbook-server")]
#[command(about = "Flat-file student registry server")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./rollbook_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum queued connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Shared secret required for create, update and delete
    #[arg(long, env = "ROLLBOOK_SECRET_KEY")]
    secret_key: Option<String>,

    /// Remove attachment files when their record is deleted
    #[arg(long)]
    cascade_attachment_delete: bool,

    /// Write the student document without indentation
    #[arg(long)]
    compact_document: bool,

    /// Largest accepted attachment in KiB
    #[arg(long, default_value = "2048")]
    max_attachment_kb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rollbook=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Rollbook Server v{}", rollbook::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);
    if args.secret_key.is_none() {
        tracing::warn!("No secret key configured; mutations are open to every client");
    }

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .secret_key(args.secret_key)
        .cascade_attachment_delete(args.cascade_attachment_delete)
        .pretty_document(!args.compact_document)
        .max_attachment_size(args.max_attachment_kb * 1024)
        .build();

    // Open engine; an unreadable document stops startup here
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
