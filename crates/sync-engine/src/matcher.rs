// crates/sync-engine/src/matcher.rs
//! Resolving desired records to their remote counterparts

use crate::types::{DesiredRecord, MatchSource, RemoteRecord};
use guidesync_core::RemoteId;

/// A remote record paired with how it was found
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub record: &'a RemoteRecord,
    pub source: MatchSource,
}

/// Finds the remote counterpart of `desired`
///
/// A cached identifier that still exists remotely wins, so renamed records
/// keep their identity. Otherwise the first record whose name matches
/// case-insensitively is adopted.
pub fn match_record<'a>(
    desired: &DesiredRecord,
    remote: &'a [RemoteRecord],
    cached_id: Option<&RemoteId>,
) -> Option<Match<'a>> {
    if let Some(record) = cached_id.and_then(|id| find_by_id(remote, id)) {
        return Some(Match {
            record,
            source: MatchSource::Cache,
        });
    }

    if let Some(id) = cached_id {
        log::debug!(
            "Cached id {} for {} ({}) no longer exists remotely",
            id,
            desired.name,
            desired.key
        );
    }

    let wanted = desired.name.to_lowercase();
    remote
        .iter()
        .find(|r| r.name.to_lowercase() == wanted)
        .map(|record| Match {
            record,
            source: MatchSource::Name,
        })
}

/// Finds a remote record by identifier only
///
/// Deletion candidates are resolved through this; a record that merely
/// shares a name is never a deletion target.
pub fn find_by_id<'a>(remote: &'a [RemoteRecord], id: &RemoteId) -> Option<&'a RemoteRecord> {
    remote.iter().find(|r| &r.id == id)
}
