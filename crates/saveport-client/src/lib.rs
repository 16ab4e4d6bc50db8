//! Sync engine and server transport for the saveport sync client
//!
//! This crate is the orchestrating layer: it consumes the save sources
//! and journal from `saveport-storage`, the bundle codec and content
//! hashing from `saveport-formats`, and an HTTP transport to the sync
//! server, and composes them into per-title and batch synchronization
//! with three-way conflict classification.
//!
//! # Overview
//!
//! - [`SyncEngine`]: upload, download, batch sync, save details,
//!   history retrieval
//! - [`Transport`]: authenticated request/response round-trips to the
//!   server's REST endpoints
//! - [`ClientConfig`]: the immutable configuration record the engine
//!   is constructed with
//! - [`decide`]: the offline three-way decision table
//! - [`titles`]: enumeration and naming glue around the engine
//!
//! The engine is single-threaded and cooperative: one store operation
//! or transport round-trip at a time, with progress callbacks and a
//! cancel flag observed between phases.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod sync;
pub mod titles;
pub mod transport;

pub use config::{ClientConfig, ConfigError, DEFAULT_UPLOAD_LIMIT};
pub use error::{SyncError, SyncResult};
pub use sync::{
    CancelToken, MAX_REPORTED_CONFLICTS, ProgressEvent, SaveDetails, SyncContext, SyncDecision,
    SyncEngine, SyncPhase, SyncSummary, decide,
};
pub use transport::Transport;
