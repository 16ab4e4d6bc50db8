//! Per-title save details for display

/// Everything the UI shows about one title's local and server state
///
/// Assembled on demand by [`SyncEngine::save_details`]; never cached.
///
/// [`SyncEngine::save_details`]: crate::sync::SyncEngine::save_details
#[derive(Debug, Clone, Default)]
pub struct SaveDetails {
    /// Whether a local save exists
    pub local_exists: bool,
    /// Local save size in bytes
    pub local_size: u64,
    /// Local file count
    pub local_file_count: usize,
    /// Local content hash; `None` when no local save exists
    pub local_hash: Option<String>,

    /// Whether the server holds a copy
    pub server_exists: bool,
    /// Server copy size in bytes
    pub server_size: u64,
    /// Server file count
    pub server_file_count: u32,
    /// Server content hash
    pub server_hash: Option<String>,
    /// When the server copy was last updated, seconds since the epoch
    pub server_last_sync: Option<u64>,
    /// Console that produced the server copy
    pub server_console_id: Option<String>,

    /// Hash recorded at this client's last successful sync
    pub last_synced_hash: Option<String>,

    /// Both sides exist and carry the same content
    pub is_synced: bool,
}
