// crates/sync-engine/src/delete.rs
//! Removing custom formats from a service on request

use crate::cache::IdentityCacheStore;
use crate::error::{SyncError, SyncResult};
use crate::types::RemoteRecord;
use guidesync_core::{InstanceName, RecordKind, RemoteApi};

/// Which custom formats to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteSelection {
    /// Every custom format on the service, tool-managed or not
    All,
    /// Case-insensitive names
    Names(Vec<String>),
}

/// Remote records chosen for deletion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletePlan {
    pub targets: Vec<RemoteRecord>,
    /// Requested names with no remote record
    pub missing: Vec<String>,
}

/// What a deletion run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    /// Records the service refused to delete, with its reason
    pub rejected: Vec<(String, String)>,
    /// Identity cache entries dropped along with their records
    pub forgotten: usize,
}

/// Fetches the service's custom formats and picks the ones to delete
pub async fn plan_custom_format_deletion(
    api: &dyn RemoteApi,
    selection: &DeleteSelection,
) -> SyncResult<DeletePlan> {
    let kind = RecordKind::CustomFormat;
    let documents = api
        .get_records(kind)
        .await
        .map_err(|e| SyncError::remote("fetch", kind, "list", e))?;
    let remote = RemoteRecord::from_documents(kind, documents)?;

    let names = match selection {
        DeleteSelection::All => {
            return Ok(DeletePlan {
                targets: remote,
                missing: Vec::new(),
            })
        }
        DeleteSelection::Names(names) => names,
    };

    let mut plan = DeletePlan::default();
    for name in names {
        let wanted = name.to_lowercase();
        match remote.iter().find(|r| r.name.to_lowercase() == wanted) {
            Some(record) if !plan.targets.iter().any(|t| t.id == record.id) => {
                plan.targets.push(record.clone())
            }
            Some(_) => {}
            None => {
                log::warn!("No custom format named '{}' on the service", name);
                plan.missing.push(name.clone());
            }
        }
    }

    Ok(plan)
}

/// Deletes the planned records and forgets their identity cache entries
///
/// A record the service rejects with a 4xx status is reported and the rest
/// proceed; any other failure stops the run. The cache is saved either way.
pub async fn delete_custom_formats(
    api: &dyn RemoteApi,
    cache: &dyn IdentityCacheStore,
    instance: &InstanceName,
    plan: &DeletePlan,
) -> SyncResult<DeleteReport> {
    let mut report = DeleteReport::default();
    let result = delete_targets(api, cache, instance, plan, &mut report).await;

    match (result, cache.persist(instance)) {
        (Ok(()), Ok(())) => Ok(report),
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(persist_error)) => {
            log::error!(
                "[{}] Failed to save identity cache: {}",
                instance,
                persist_error
            );
            Err(e)
        }
    }
}

async fn delete_targets(
    api: &dyn RemoteApi,
    cache: &dyn IdentityCacheStore,
    instance: &InstanceName,
    plan: &DeletePlan,
    report: &mut DeleteReport,
) -> SyncResult<()> {
    let kind = RecordKind::CustomFormat;
    let entries = cache.entries(instance)?;

    for record in &plan.targets {
        match api.delete_record(kind, &record.id).await {
            Ok(()) => {
                log::info!("Deleted {} '{}' (id {})", kind, record.name, record.id);
                for entry in entries.iter().filter(|e| e.id == record.id) {
                    cache.remove(instance, &entry.trash_id)?;
                    report.forgotten += 1;
                }
                report.deleted.push(record.name.clone());
            }
            Err(e) if e.is_client_error() => {
                log::warn!(
                    "[{}] Service refused to delete {} '{}' (id {}): {}",
                    instance,
                    kind,
                    record.name,
                    record.id,
                    e
                );
                report.rejected.push((record.name.clone(), e.to_string()));
            }
            Err(e) => {
                log::error!(
                    "[{}] Failed to delete {} '{}' (id {}): {}",
                    instance,
                    kind,
                    record.name,
                    record.id,
                    e
                );
                return Err(SyncError::remote(
                    "delete",
                    kind,
                    format!("'{}' (id {})", record.name, record.id),
                    e,
                ));
            }
        }
    }

    Ok(())
}
