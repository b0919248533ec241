// crates/sync-engine/src/classifier.rs
//! Sorting desired records into New / Updated / Unchanged / Deleted

use crate::cache::IdentityCacheStore;
use crate::error::SyncResult;
use crate::matcher::{find_by_id, match_record};
use crate::merge::{merge, normalize_fields};
use crate::types::{DesiredRecord, RecordFailure, RemoteRecord, Transaction, TransactionSet};
use guidesync_core::{ContentKey, InstanceName, RemoteId};
use std::collections::HashSet;

/// Classifies every desired record against the current remote records
///
/// A record whose document cannot be merged is reported in
/// [`TransactionSet::failures`] and does not affect its siblings. Cache
/// entries that are no longer desired become deletions only when their
/// identifier still exists remotely; the rest are reported as stale.
pub fn classify(
    desired: &[DesiredRecord],
    remote: &[RemoteRecord],
    cache: &dyn IdentityCacheStore,
    instance: &InstanceName,
) -> SyncResult<TransactionSet> {
    let mut set = TransactionSet::default();

    for record in desired {
        let cached_id = cache.lookup(instance, &record.key)?;
        match classify_record(record, remote, cached_id.as_ref()) {
            Ok(transaction) => set.transactions.push(transaction),
            Err(failure) => {
                log::warn!(
                    "Skipping {} ({}): {}",
                    failure.name,
                    failure.key,
                    failure.error
                );
                set.failures.push(failure);
            }
        }
    }

    let desired_keys: HashSet<&ContentKey> = desired.iter().map(|r| &r.key).collect();
    for entry in cache.entries(instance)? {
        if desired_keys.contains(&entry.trash_id) {
            continue;
        }

        match find_by_id(remote, &entry.id) {
            Some(existing) => set.transactions.push(Transaction::Deleted {
                key: entry.trash_id,
                name: existing.name.clone(),
                id: entry.id,
            }),
            None => {
                log::debug!(
                    "{} ({}) was removed outside of guidesync; forgetting id {}",
                    entry.name,
                    entry.trash_id,
                    entry.id
                );
                set.stale.push(entry);
            }
        }
    }

    log::debug!(
        "Classified {} record(s): {} new, {} updated, {} unchanged, {} deleted, {} failed",
        desired.len(),
        set.new_records().count(),
        set.updated().count(),
        set.unchanged().count(),
        set.deleted().count(),
        set.failures.len()
    );

    Ok(set)
}

fn classify_record(
    record: &DesiredRecord,
    remote: &[RemoteRecord],
    cached_id: Option<&RemoteId>,
) -> Result<Transaction, RecordFailure> {
    let fail = |error| RecordFailure {
        key: record.key.clone(),
        name: record.name.clone(),
        error,
    };

    let payload = normalize_fields(&record.payload).map_err(fail)?;

    let Some(found) = match_record(record, remote, cached_id) else {
        return Ok(Transaction::New {
            key: record.key.clone(),
            name: record.name.clone(),
            payload,
        });
    };

    let merged = merge(&found.record.payload, &payload).map_err(fail)?;
    if merged == found.record.payload {
        Ok(Transaction::Unchanged {
            key: record.key.clone(),
            name: record.name.clone(),
            id: found.record.id.clone(),
            matched_by: found.source,
        })
    } else {
        Ok(Transaction::Updated {
            key: record.key.clone(),
            name: record.name.clone(),
            id: found.record.id.clone(),
            payload: merged,
            matched_by: found.source,
        })
    }
}
