//! Configuration for Rollbook
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, RollbookError};

/// Main configuration for a Rollbook instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── students.json    (the whole record collection)
    ///     └── uploads/         (attachment files)
    pub data_dir: PathBuf,

    /// Write the student document pretty-printed (human-diffable)
    pub pretty_document: bool,

    // -------------------------------------------------------------------------
    // Attachment Configuration
    // -------------------------------------------------------------------------
    /// Per-attachment size ceiling (in bytes)
    pub max_attachment_size: usize,

    /// Remove a record's attachment files when the record is deleted
    pub cascade_attachment_delete: bool,

    // -------------------------------------------------------------------------
    // Access Configuration
    // -------------------------------------------------------------------------
    /// Shared secret gating create/update/delete at the network layer.
    /// `None` disables the gate.
    pub secret_key: Option<String>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max queued client connections
    pub max_connections: usize,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./rollbook_data"),
            pretty_document: true,
            max_attachment_size: 2 * 1024 * 1024, // 2 MiB
            cascade_attachment_delete: false,
            secret_key: None,
            listen_addr: "127.0.0.1:7878".to_string(),
            max_connections: 64,
            worker_threads: 8,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine or server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(RollbookError::Config("data_dir is empty".to_string()));
        }
        if self.max_attachment_size == 0 {
            return Err(RollbookError::Config(
                "max_attachment_size must be positive".to_string(),
            ));
        }
        if self.worker_threads == 0 || self.max_connections == 0 {
            return Err(RollbookError::Config(
                "worker_threads and max_connections must be positive".to_string(),
            ));
        }
        if matches!(&self.secret_key, Some(key) if key.is_empty()) {
            return Err(RollbookError::Config("secret_key is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Pretty-print the student document
    pub fn pretty_document(mut self, pretty: bool) -> Self {
        self.config.pretty_document = pretty;
        self
    }

    /// Set the per-attachment size ceiling (in bytes)
    pub fn max_attachment_size(mut self, size: usize) -> Self {
        self.config.max_attachment_size = size;
        self
    }

    /// Delete attachment files together with their record
    pub fn cascade_attachment_delete(mut self, cascade: bool) -> Self {
        self.config.cascade_attachment_delete = cascade;
        self
    }

    /// Set the shared secret required for mutating requests
    pub fn secret_key(mut self, key: Option<String>) -> Self {
        self.config.secret_key = key;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
