//! # Rollbook
//!
//! A flat-file student registry with:
//! - One JSON document holding every student record
//! - Roll numbers derived on demand from name, date of birth and mobile
//! - Exam results filed against the live roll number
//! - Photo, signature and sheet attachments stored beside the document
//! - A framed TCP protocol for remote clients
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (worker pool, secret-key gate)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        (serialized mutations, lock-free reads)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!        ┌──────────────┼──────────────┐
//!        │              │              │
//!        ▼              ▼              ▼
//!  ┌───────────┐  ┌───────────┐  ┌─────────────┐
//!  │  Merger   │  │  Records  │  │ Attachments │
//!  │ (results) │  │  (JSON)   │  │  (uploads/) │
//!  └─────┬─────┘  └─────┬─────┘  └─────────────┘
//!        │              │
//!        └──────┬───────┘
//!               ▼
//!        ┌─────────────┐
//!        │    Roll     │
//!        │ (derivation)│
//!        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod roll;
pub mod record;
pub mod storage;
pub mod merger;
pub mod export;
pub mod protocol;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, RollbookError};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Rollbook
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
