//! Synchronization engine
//!
//! [`SyncEngine`] drives the per-title state machine (read → hash →
//! encode/decode → transfer → journal) and the three-phase batch
//! protocol. [`decide`] is the offline classification used when the
//! server is not consulted.

mod batch;
mod decision;
mod details;
mod engine;
mod progress;

pub use batch::{MAX_REPORTED_CONFLICTS, SyncSummary};
pub use decision::{SyncDecision, decide};
pub use details::SaveDetails;
pub use engine::SyncEngine;
pub use progress::{CancelToken, ProgressEvent, SyncContext, SyncPhase};
