// crates/sync-engine/src/lib.rs
//! Reconciliation engine
//!
//! Brings the custom formats, quality profile scores and release profiles of
//! a Radarr or Sonarr instance in line with the guide and the config:
//! - Merging desired documents onto remote ones
//! - Matching records through the identity cache, then by name
//! - Classifying records as new, updated, unchanged or deleted
//! - Applying transactions and recording confirmed identifiers
//! - Aggregating per-profile scores
//! - Deleting custom formats on request
//!
//! # Example
//!
//! ```rust
//! use guidesync_sync_engine::{classify, DesiredRecord, MemoryCacheStore};
//! use guidesync_core::InstanceName;
//! use serde_json::json;
//!
//! let desired = vec![DesiredRecord::new("a1", "Foo", json!({ "name": "Foo" }))];
//! let cache = MemoryCacheStore::new();
//! let set = classify(&desired, &[], &cache, &InstanceName::new("movies")).unwrap();
//! assert_eq!(set.new_records().count(), 1);
//! ```

mod aggregate;
mod cache;
mod classifier;
mod delete;
mod engine;
mod error;
mod executor;
mod guide_index;
mod matcher;
mod merge;
mod quality_profile;
mod release_profile;
mod types;

pub use aggregate::{
    aggregate_scores, profile_associations, FormatScore, ProfileAssociation,
    QualityProfileAggregate, ScoreAggregation, ScoreConflict,
};
pub use cache::{IdentityCacheStore, JsonFileCacheStore, MemoryCacheStore};
pub use classifier::classify;
pub use delete::{
    delete_custom_formats, plan_custom_format_deletion, DeletePlan, DeleteReport, DeleteSelection,
};
pub use engine::{
    run_instances, select_custom_formats, ExitStatus, InstanceOutcome, InstanceReport,
    InstanceStatus, RunReport, SyncEngine,
};
pub use error::{MergeError, SyncError, SyncResult};
pub use executor::{ApplyReport, TransactionExecutor};
pub use guide_index::{GuideIndex, IndexedFormat};
pub use matcher::{find_by_id, match_record, Match};
pub use merge::{merge, normalize_fields};
pub use quality_profile::{
    plan_profile_update, sync_quality_profiles, ProfileUpdate, QualityProfileReport, ScoreChange,
};
pub use release_profile::{
    build_payload as build_release_profile_payload, profile_title, resolve_tags,
    select_release_profiles, sync_release_profiles, ReleaseProfileReport, SelectedReleaseProfile,
};
pub use types::{
    CacheEntry, DesiredRecord, MatchSource, RecordFailure, RemoteRecord, Transaction,
    TransactionSet,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: MemoryCacheStore = MemoryCacheStore::new();
        let _: GuideIndex = GuideIndex::new();
        let _: RunReport = RunReport::new();
        let _: TransactionSet = TransactionSet::default();
        let _: DeletePlan = DeletePlan::default();
    }
}
