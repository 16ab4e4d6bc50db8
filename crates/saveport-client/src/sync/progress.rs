//! Progress reporting and cooperative cancellation

use saveport_formats::TitleId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observable phase of one title's sync
///
/// Phases are strictly ordered within a title; the engine reports each
/// transition through the progress callback and never interleaves two
/// titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Reading the local save
    Reading,
    /// Hashing the file list
    Hashing,
    /// Building the transfer bundle
    Encoding,
    /// Round-tripping with the server
    Sending,
    /// Parsing a received bundle
    Decoding,
    /// Writing the save store
    Writing,
    /// Recording the reconciled hash
    Journaling,
    /// The title finished successfully
    Done,
    /// The title failed; the error is returned to the caller
    Failed,
}

/// One progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Title the phase belongs to
    pub title_id: TitleId,
    /// Phase just entered
    pub phase: SyncPhase,
}

/// Cooperative cancellation flag
///
/// Cloned handles share one flag. The engine observes it between
/// phases; an operation already mid-I/O completes first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-call context carrying the progress callback and cancel flag
///
/// The callback may suspend to update a UI but must not re-enter the
/// engine for the same title.
#[derive(Default)]
pub struct SyncContext<'a> {
    progress: Option<&'a mut dyn FnMut(ProgressEvent)>,
    cancel: CancelToken,
}

impl<'a> SyncContext<'a> {
    /// Context with no callback and a fresh cancel token
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a progress callback
    #[must_use]
    pub fn on_progress(mut self, callback: &'a mut dyn FnMut(ProgressEvent)) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Attach a shared cancel token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether the caller asked to stop
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn emit(&mut self, title_id: TitleId, phase: SyncPhase) {
        if let Some(callback) = self.progress.as_mut() {
            callback(ProgressEvent { title_id, phase });
        }
    }
}
