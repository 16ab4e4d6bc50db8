//! The offline three-way sync decision

use crate::sync::details::SaveDetails;

/// What should happen to a title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Local and server agree (or neither side has a save)
    UpToDate,
    /// Only the local side changed; push it
    Upload,
    /// Only the server side changed; pull it
    Download,
    /// Both sides changed since the last reconciliation
    Conflict,
}

/// Classify a title without consulting the server
///
/// The three-way comparison against the last-synced hash distinguishes
/// "one side changed" from "both sides changed". Without sync history,
/// differing hashes are unresolvable and surface as a conflict. The
/// server's batch plan supersedes this whenever it is available.
pub fn decide(details: &SaveDetails) -> SyncDecision {
    match (details.local_exists, details.server_exists) {
        (false, false) => SyncDecision::UpToDate,
        (true, false) => SyncDecision::Upload,
        (false, true) => SyncDecision::Download,
        (true, true) => {
            let local = details.local_hash.as_deref();
            let server = details.server_hash.as_deref();
            if local == server {
                return SyncDecision::UpToDate;
            }
            match details.last_synced_hash.as_deref() {
                Some(last) if Some(last) == server => SyncDecision::Upload,
                Some(last) if Some(last) == local => SyncDecision::Download,
                _ => SyncDecision::Conflict,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H_LOCAL: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const H_SERVER: &str = "2222222222222222222222222222222222222222222222222222222222222222";
    const H_OTHER: &str = "3333333333333333333333333333333333333333333333333333333333333333";

    fn details(
        local: Option<&str>,
        server: Option<&str>,
        last: Option<&str>,
    ) -> SaveDetails {
        SaveDetails {
            local_exists: local.is_some(),
            local_hash: local.map(str::to_string),
            server_exists: server.is_some(),
            server_hash: server.map(str::to_string),
            last_synced_hash: last.map(str::to_string),
            ..SaveDetails::default()
        }
    }

    #[test]
    fn test_neither_side_is_up_to_date() {
        assert_eq!(decide(&details(None, None, None)), SyncDecision::UpToDate);
        // History is irrelevant when nothing exists
        assert_eq!(
            decide(&details(None, None, Some(H_OTHER))),
            SyncDecision::UpToDate
        );
    }

    #[test]
    fn test_local_only_uploads() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), None, None)),
            SyncDecision::Upload
        );
        assert_eq!(
            decide(&details(Some(H_LOCAL), None, Some(H_OTHER))),
            SyncDecision::Upload
        );
    }

    #[test]
    fn test_server_only_downloads() {
        assert_eq!(
            decide(&details(None, Some(H_SERVER), None)),
            SyncDecision::Download
        );
        assert_eq!(
            decide(&details(None, Some(H_SERVER), Some(H_OTHER))),
            SyncDecision::Download
        );
    }

    #[test]
    fn test_equal_hashes_are_up_to_date() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_LOCAL), None)),
            SyncDecision::UpToDate
        );
        // Even with unrelated history
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_LOCAL), Some(H_OTHER))),
            SyncDecision::UpToDate
        );
    }

    #[test]
    fn test_server_unchanged_since_last_sync_uploads() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_SERVER), Some(H_SERVER))),
            SyncDecision::Upload
        );
    }

    #[test]
    fn test_local_unchanged_since_last_sync_downloads() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_SERVER), Some(H_LOCAL))),
            SyncDecision::Download
        );
    }

    #[test]
    fn test_three_distinct_hashes_conflict() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_SERVER), Some(H_OTHER))),
            SyncDecision::Conflict
        );
    }

    #[test]
    fn test_divergence_without_history_conflicts() {
        assert_eq!(
            decide(&details(Some(H_LOCAL), Some(H_SERVER), None)),
            SyncDecision::Conflict
        );
    }
}
