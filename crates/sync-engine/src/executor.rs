// crates/sync-engine/src/executor.rs
//! Applying a transaction set to a service instance

use crate::cache::IdentityCacheStore;
use crate::error::{SyncError, SyncResult};
use crate::types::{CacheEntry, MatchSource, Transaction, TransactionSet};
use guidesync_core::{InstanceName, RecordKind, RemoteApi, RemoteId};

/// What one batch did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    /// Unchanged records first linked to the cache by name
    pub adopted: usize,
    /// Cache entries dropped because the record vanished remotely
    pub forgotten: usize,
}

impl ApplyReport {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Applies transactions one at a time and records confirmed identifiers
pub struct TransactionExecutor<'a> {
    api: &'a dyn RemoteApi,
    cache: &'a dyn IdentityCacheStore,
    instance: &'a InstanceName,
}

impl<'a> TransactionExecutor<'a> {
    pub fn new(
        api: &'a dyn RemoteApi,
        cache: &'a dyn IdentityCacheStore,
        instance: &'a InstanceName,
    ) -> Self {
        Self {
            api,
            cache,
            instance,
        }
    }

    /// Applies creates and updates in declaration order, then deletions
    ///
    /// The first failing remote call stops the batch; everything confirmed
    /// before it stays recorded in the cache. With `delete_enabled` false
    /// the deletion pass is skipped and its cache entries are kept.
    pub async fn apply(
        &self,
        kind: RecordKind,
        set: &TransactionSet,
        delete_enabled: bool,
    ) -> SyncResult<ApplyReport> {
        let mut report = ApplyReport::default();

        for entry in &set.stale {
            self.cache.remove(self.instance, &entry.trash_id)?;
            report.forgotten += 1;
        }

        for transaction in set
            .transactions
            .iter()
            .filter(|t| !matches!(t, Transaction::Deleted { .. }))
        {
            self.apply_one(kind, transaction, &mut report).await?;
        }

        if !delete_enabled {
            let skipped = set.deleted().count();
            if skipped > 0 {
                log::info!(
                    "Keeping {} {}(s) no longer in the config; deletion is disabled",
                    skipped,
                    kind
                );
            }
            return Ok(report);
        }

        for transaction in set.deleted() {
            self.apply_one(kind, transaction, &mut report).await?;
        }

        Ok(report)
    }

    async fn apply_one(
        &self,
        kind: RecordKind,
        transaction: &Transaction,
        report: &mut ApplyReport,
    ) -> SyncResult<()> {
        match transaction {
            Transaction::New { key, name, payload } => {
                let created = self
                    .api
                    .create_record(kind, payload)
                    .await
                    .map_err(|e| self.failed("create", kind, format!("'{name}'"), e))?;

                let id = RemoteId::from_document(&created).ok_or_else(|| {
                    SyncError::InvalidRemoteRecord {
                        kind,
                        reason: format!("created '{name}' has no 'id'"),
                    }
                })?;

                log::info!("Created {} '{}' (id {})", kind, name, id);
                self.cache
                    .store(self.instance, CacheEntry::new(key.clone(), name, id))?;
                report.created += 1;
            }
            Transaction::Updated {
                key,
                name,
                id,
                payload,
                ..
            } => {
                self.api
                    .update_record(kind, id, payload)
                    .await
                    .map_err(|e| self.failed("update", kind, format!("'{name}' (id {id})"), e))?;

                log::info!("Updated {} '{}' (id {})", kind, name, id);
                self.cache
                    .store(self.instance, CacheEntry::new(key.clone(), name, id.clone()))?;
                report.updated += 1;
            }
            Transaction::Unchanged {
                key,
                name,
                id,
                matched_by,
            } => {
                if *matched_by == MatchSource::Name {
                    log::debug!("Adopting existing {} '{}' (id {})", kind, name, id);
                    self.cache
                        .store(self.instance, CacheEntry::new(key.clone(), name, id.clone()))?;
                    report.adopted += 1;
                }
                report.unchanged += 1;
            }
            Transaction::Deleted { key, name, id } => {
                self.api
                    .delete_record(kind, id)
                    .await
                    .map_err(|e| self.failed("delete", kind, format!("'{name}' (id {id})"), e))?;

                log::info!("Deleted {} '{}' (id {})", kind, name, id);
                self.cache.remove(self.instance, key)?;
                report.deleted += 1;
            }
        }

        Ok(())
    }

    fn failed(
        &self,
        action: &'static str,
        kind: RecordKind,
        record: String,
        source: guidesync_core::RemoteError,
    ) -> SyncError {
        log::error!(
            "[{}] Failed to {} {} {}: {}",
            self.instance,
            action,
            kind,
            record,
            source
        );
        SyncError::remote(action, kind, record, source)
    }
}
