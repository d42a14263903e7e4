//! Network Module
//!
//! TCP server and client handling. This is the routing layer in front of
//! the engine: it owns the secret-key gate and maps errors to statuses.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections (bounded crossbeam queue)
//! - Commands routed through Engine

mod server;
mod connection;
mod client;

pub use server::Server;
pub use connection::Connection;
pub use client::Client;
