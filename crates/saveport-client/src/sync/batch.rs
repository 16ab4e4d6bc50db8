//! Batch synchronization against the server's plan

use crate::error::SyncResult;
use crate::protocol::{SyncRequest, TitleReport};
use crate::sync::engine::{SyncEngine, hash_or_zero};
use crate::sync::progress::SyncContext;
use saveport_formats::{TitleId, ZERO_HASH_HEX, file_list};
use saveport_storage::{SaveAccess, Title};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Most conflict title ids surfaced for display
pub const MAX_REPORTED_CONFLICTS: usize = 8;

/// Outcome counts of one batch sync
///
/// Every considered title lands in exactly one bucket, so the counts
/// total the number of titles the batch looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Titles pushed to the server
    pub uploaded: usize,
    /// Titles pulled from the server
    pub downloaded: usize,
    /// Titles the server reported as already matching
    pub up_to_date: usize,
    /// Titles needing manual resolution
    pub conflicts: usize,
    /// Titles whose transfer failed
    pub failed: usize,
    /// Plan entries this client could not act on
    pub skipped: usize,
    /// First few conflicted title ids, for display
    pub conflict_titles: Vec<TitleId>,
    /// Whether the batch stopped early on the cancel flag
    pub cancelled: bool,
}

impl<S: SaveAccess> SyncEngine<S> {
    /// Synchronize every non-cartridge title against the server
    ///
    /// Three phases: report local metadata, receive the server's plan,
    /// then act on the plan (uploads first, then downloads, then
    /// server-only downloads). Per-title failures are counted, never
    /// fatal. Cartridge titles are manual-only and not considered.
    /// Conflicted titles that have no local save are reclassified as
    /// downloads, since there is nothing to lose; the rest get their
    /// `in_conflict` marker set.
    pub async fn sync_all(
        &mut self,
        titles: &mut [Title],
        ctx: &mut SyncContext<'_>,
    ) -> SyncResult<SyncSummary> {
        // Phase A: local metadata. A failed read contributes the
        // zero-hash placeholder rather than aborting the batch. Hashes
        // are cached and reused by the upload phase; saves are assumed
        // stable for the duration of the batch.
        let now = unix_timestamp();
        let mut cached_hashes: HashMap<TitleId, String> = HashMap::new();
        let mut reports = Vec::new();

        for title in titles.iter() {
            if title.is_cartridge() {
                continue;
            }
            let (hash, size) = match self.store_mut().read_save(title) {
                Ok(files) => (hash_or_zero(&files), file_list::total_size(&files)),
                Err(err) => {
                    warn!("metadata read failed for {}: {err}", title.id);
                    (ZERO_HASH_HEX.to_string(), 0)
                }
            };
            cached_hashes.insert(title.id, hash.clone());
            reports.push(TitleReport {
                title_id: title.id.to_hex(),
                save_hash: hash,
                timestamp: now,
                size,
                last_synced_hash: self.journal().load(title.id),
            });
        }
        debug!("reporting {} titles", reports.len());

        let mut summary = SyncSummary::default();
        if ctx.is_cancelled() {
            summary.cancelled = true;
            return Ok(summary);
        }

        // Phase B: the server's classification is authoritative
        let request = SyncRequest {
            console_id: self.config().console_id.clone(),
            titles: reports,
        };
        let plan = self.transport().sync_plan(&request).await?;
        summary.up_to_date = plan.up_to_date.len();

        let index: HashMap<String, usize> = titles
            .iter()
            .enumerate()
            .filter(|(_, title)| !title.is_cartridge())
            .map(|(i, title)| (title.id.to_hex(), i))
            .collect();

        // A conflict with no local save has nothing to lose: download
        let mut downloads = plan.download;
        let mut conflicts = Vec::new();
        for id_hex in plan.conflict {
            let no_local_save = index
                .get(&id_hex)
                .and_then(|&i| cached_hashes.get(&titles[i].id))
                .is_some_and(|hash| hash == ZERO_HASH_HEX);
            if no_local_save {
                debug!("reclassifying conflict {id_hex} as download: no local save");
                downloads.push(id_hex);
            } else {
                conflicts.push(id_hex);
            }
        }

        // Phase C: act on the plan in its order
        for id_hex in &plan.upload {
            if ctx.is_cancelled() {
                summary.cancelled = true;
                return Ok(summary);
            }
            let Some(&i) = index.get(id_hex) else {
                summary.skipped += 1;
                continue;
            };
            let title = titles[i].clone();
            let cached = cached_hashes.get(&title.id).cloned();
            match self.upload_with_hash(&title, cached, ctx).await {
                Ok(()) => summary.uploaded += 1,
                Err(err) => {
                    warn!("upload failed for {}: {err}", title.id);
                    summary.failed += 1;
                }
            }
        }

        for id_hex in downloads.iter().chain(plan.server_only.iter()) {
            if ctx.is_cancelled() {
                summary.cancelled = true;
                return Ok(summary);
            }
            let Some(&i) = index.get(id_hex) else {
                summary.skipped += 1;
                continue;
            };
            let title = titles[i].clone();
            match self.download(&title, ctx).await {
                Ok(()) => summary.downloaded += 1,
                Err(err) => {
                    warn!("download failed for {}: {err}", title.id);
                    summary.failed += 1;
                }
            }
        }

        summary.conflicts = conflicts.len();
        for id_hex in &conflicts {
            if let Some(&i) = index.get(id_hex) {
                titles[i].in_conflict = true;
            }
            if summary.conflict_titles.len() < MAX_REPORTED_CONFLICTS
                && let Ok(id) = TitleId::from_hex(id_hex)
            {
                summary.conflict_titles.push(id);
            }
        }

        info!(
            "sync finished: {} up, {} down, {} current, {} conflicts, {} failed, {} skipped",
            summary.uploaded,
            summary.downloaded,
            summary.up_to_date,
            summary.conflicts,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
