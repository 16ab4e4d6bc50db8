//! The sync engine: per-title transfers and details assembly

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::SaveVersion;
use crate::sync::details::SaveDetails;
use crate::sync::progress::{SyncContext, SyncPhase};
use crate::transport::Transport;
use saveport_formats::{ContentHash, ContentHasher, SaveFile, TitleId, ZERO_HASH_HEX, bundle};
use saveport_storage::{SaveAccess, StateJournal, Title};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Journal directory name under the configured state directory
const JOURNAL_DIR: &str = "journal";

/// The client-side synchronization engine
///
/// Orchestrates the save store, bundle codec, journal, and transport to
/// move one title at a time. All I/O is sequential: one blocking store
/// operation or one transport round-trip is in flight at any moment,
/// and progress callbacks fire between phases.
pub struct SyncEngine<S: SaveAccess> {
    config: ClientConfig,
    transport: Transport,
    store: S,
    journal: StateJournal,
}

impl<S: SaveAccess> SyncEngine<S> {
    /// Build an engine over a save store
    pub fn new(config: ClientConfig, store: S) -> SyncResult<Self> {
        let transport = Transport::new(&config)?;
        let journal = StateJournal::new(config.state_directory.join(JOURNAL_DIR));
        Ok(Self {
            config,
            transport,
            store,
            journal,
        })
    }

    /// The injected configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The server transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// The last-synced journal
    pub fn journal(&self) -> &StateJournal {
        &self.journal
    }

    /// Push one title's save to the server
    ///
    /// A title without a local save is a successful no-op: there is
    /// nothing to upload and the network is never touched.
    pub async fn upload(&mut self, title: &Title, ctx: &mut SyncContext<'_>) -> SyncResult<()> {
        let result = self.upload_with_hash(title, None, ctx).await;
        self.finish(title.id, &result, ctx);
        result
    }

    /// Pull one title's save from the server
    pub async fn download(&mut self, title: &Title, ctx: &mut SyncContext<'_>) -> SyncResult<()> {
        let result = self.download_inner(title, ctx).await;
        self.finish(title.id, &result, ctx);
        result
    }

    /// Pull one historical version of a title's save
    pub async fn download_history(
        &mut self,
        title: &Title,
        timestamp: u64,
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<()> {
        let result = self.download_history_inner(title, timestamp, ctx).await;
        self.finish(title.id, &result, ctx);
        result
    }

    /// List the server's stored versions of a title's save
    pub async fn save_history(&self, title: &Title) -> SyncResult<Vec<SaveVersion>> {
        self.transport.history(title.id).await
    }

    /// Assemble the local/server/journal view of one title
    ///
    /// A failed metadata request degrades to `server_exists = false`
    /// instead of failing the call.
    pub async fn save_details(&mut self, title: &Title) -> SyncResult<SaveDetails> {
        let files = self.store.read_save(title)?;
        let local_exists = !files.is_empty();
        let local_hash = local_exists.then(|| ContentHash::of_file_list(&files).to_hex());

        let meta = match self.transport.save_meta(title.id).await {
            Ok(meta) => meta,
            Err(err) => {
                warn!("metadata fetch failed for {}: {err}", title.id);
                None
            }
        };
        let last_synced_hash = self.journal.load(title.id);

        let mut details = SaveDetails {
            local_exists,
            local_size: saveport_formats::file_list::total_size(&files),
            local_file_count: files.len(),
            local_hash,
            last_synced_hash,
            ..SaveDetails::default()
        };
        if let Some(meta) = meta {
            details.is_synced =
                local_exists && details.local_hash.as_deref() == Some(meta.save_hash.as_str());
            details.server_exists = true;
            details.server_size = meta.save_size;
            details.server_file_count = meta.file_count;
            details.server_hash = Some(meta.save_hash);
            details.server_last_sync = Some(meta.last_sync);
            details.server_console_id = Some(meta.console_id);
        }
        Ok(details)
    }

    /// Upload with an optional hash carried over from batch metadata
    pub(crate) async fn upload_with_hash(
        &mut self,
        title: &Title,
        cached_hash: Option<String>,
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<()> {
        ctx.emit(title.id, SyncPhase::Reading);
        let files = self.store.read_save(title)?;
        if files.is_empty() {
            debug!("{}: no local save, nothing to upload", title.id);
            return Ok(());
        }

        ctx.emit(title.id, SyncPhase::Hashing);
        let hash =
            cached_hash.unwrap_or_else(|| ContentHash::of_file_list(&files).to_hex());

        ctx.emit(title.id, SyncPhase::Encoding);
        let encoded = bundle::encode(title.id, unix_timestamp(), &files)?;
        let limit = self.config.upload_size_limit_bytes;
        if encoded.len() as u64 > limit {
            return Err(SyncError::TooLarge {
                size: encoded.len(),
                limit,
            });
        }

        ctx.emit(title.id, SyncPhase::Sending);
        self.transport.upload_bundle(title.id, encoded).await?;

        ctx.emit(title.id, SyncPhase::Journaling);
        self.record_journal(title.id, &hash);
        Ok(())
    }

    async fn download_inner(
        &mut self,
        title: &Title,
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<()> {
        ctx.emit(title.id, SyncPhase::Sending);
        let bytes = self.transport.download_bundle(title.id).await?;
        self.apply_bundle(title, &bytes, ctx)
    }

    async fn download_history_inner(
        &mut self,
        title: &Title,
        timestamp: u64,
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<()> {
        ctx.emit(title.id, SyncPhase::Sending);
        let bytes = self.transport.history_bundle(title.id, timestamp).await?;
        self.apply_bundle(title, &bytes, ctx)
    }

    /// Decode, hash, write, journal: shared by both download paths
    ///
    /// The content hash is computed from the decoded view while the
    /// decode buffer is still live, then the files are copied out for
    /// the store.
    fn apply_bundle(
        &mut self,
        title: &Title,
        bytes: &[u8],
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<()> {
        ctx.emit(title.id, SyncPhase::Decoding);
        let decoded = bundle::decode(bytes)?;

        ctx.emit(title.id, SyncPhase::Hashing);
        let hash = if decoded.is_empty() {
            ZERO_HASH_HEX.to_string()
        } else {
            let mut hasher = ContentHasher::new();
            for file in decoded.files() {
                hasher.update(file.data);
            }
            hasher.finish().to_hex()
        };

        let files = decoded.into_files();
        ctx.emit(title.id, SyncPhase::Writing);
        self.store.write_save(title, &files)?;

        ctx.emit(title.id, SyncPhase::Journaling);
        self.record_journal(title.id, &hash);
        Ok(())
    }

    /// Journal the reconciled hash; failures never undo the transfer
    fn record_journal(&self, title_id: TitleId, hash: &str) {
        if let Err(err) = self.journal.store(title_id, hash) {
            warn!("journal write failed for {title_id}: {err}");
        }
    }

    fn finish(&self, title_id: TitleId, result: &SyncResult<()>, ctx: &mut SyncContext<'_>) {
        match result {
            Ok(()) => ctx.emit(title_id, SyncPhase::Done),
            Err(_) => ctx.emit(title_id, SyncPhase::Failed),
        }
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

/// Local-save hash with the all-zero substitution for empty saves
pub(crate) fn hash_or_zero(files: &[SaveFile]) -> String {
    if files.is_empty() {
        ZERO_HASH_HEX.to_string()
    } else {
        ContentHash::of_file_list(files).to_hex()
    }
}

/// Wall-clock seconds since the Unix epoch
fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}
