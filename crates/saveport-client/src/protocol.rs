//! JSON request and response bodies of the sync server protocol

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST /sync`: everything the server needs to plan a batch
#[derive(Debug, Clone, Serialize)]
pub struct SyncRequest {
    /// The reporting device
    pub console_id: String,
    /// One report per locally known, non-cartridge title
    pub titles: Vec<TitleReport>,
}

/// One title's local state as reported to the planner
#[derive(Debug, Clone, Serialize)]
pub struct TitleReport {
    /// Title id, 16 uppercase hex
    pub title_id: String,
    /// Content hash of the local save, or the all-zero hash if none
    pub save_hash: String,
    /// Report time, seconds since the Unix epoch
    pub timestamp: u64,
    /// Local save size in bytes
    pub size: u64,
    /// Last server-reconciled hash, omitted when no history exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_hash: Option<String>,
}

/// The server's batch plan: five disjoint title-id lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncPlan {
    /// Local save is newer; push it
    #[serde(default)]
    pub upload: Vec<String>,
    /// Server save is newer; pull it
    #[serde(default)]
    pub download: Vec<String>,
    /// Known only to the server
    #[serde(default)]
    pub server_only: Vec<String>,
    /// Both sides changed since the last reconciliation
    #[serde(default)]
    pub conflict: Vec<String>,
    /// Nothing to do
    #[serde(default)]
    pub up_to_date: Vec<String>,
}

/// Response of `GET /saves/{tid}/meta`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveMeta {
    /// Content hash of the server's copy
    pub save_hash: String,
    /// Size of the server's copy in bytes
    pub save_size: u64,
    /// Number of files in the server's copy
    pub file_count: u32,
    /// When the server copy was last updated, seconds since the epoch
    pub last_sync: u64,
    /// Console that produced the server copy
    pub console_id: String,
}

/// One entry of `GET /saves/{tid}/history`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveVersion {
    /// Bundle creation time, seconds since the epoch
    pub timestamp: u64,
    /// Payload size in bytes
    pub size: u64,
    /// Number of files in the version
    pub file_count: u32,
}

/// Response of `GET /saves/{tid}/history`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    /// Versions, newest first
    pub versions: Vec<SaveVersion>,
}

/// Body of `POST /titles/names`
#[derive(Debug, Clone, Serialize)]
pub struct NamesRequest {
    /// Product codes to resolve
    pub codes: Vec<String>,
}

/// Response of `POST /titles/names`
#[derive(Debug, Clone, Deserialize)]
pub struct NamesResponse {
    /// Human-readable name per resolved product code
    pub names: HashMap<String, String>,
}

/// Response of `GET /update/check`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInfo {
    /// Latest released client version
    pub latest: String,
    /// Where to fetch it, when an update exists
    #[serde(default)]
    pub url: Option<String>,
    /// Release notes, when provided
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_title_report_omits_absent_history() {
        let report = TitleReport {
            title_id: "0004000000112233".to_string(),
            save_hash: "ab".repeat(32),
            timestamp: 1_700_000_000,
            size: 4,
            last_synced_hash: None,
        };
        let json = serde_json::to_string(&report).expect("serializes");
        assert!(!json.contains("last_synced_hash"));

        let report = TitleReport {
            last_synced_hash: Some("cd".repeat(32)),
            ..report
        };
        let json = serde_json::to_string(&report).expect("serializes");
        assert!(json.contains("last_synced_hash"));
    }

    #[test]
    fn test_sync_plan_tolerates_missing_lists() {
        let plan: SyncPlan = serde_json::from_str(r#"{"upload":["AAAA000011112222"]}"#)
            .expect("partial plans deserialize");
        assert_eq!(plan.upload.len(), 1);
        assert!(plan.download.is_empty());
        assert!(plan.server_only.is_empty());
        assert!(plan.conflict.is_empty());
        assert!(plan.up_to_date.is_empty());
    }
}
