// crates/sync-engine/src/quality_profile.rs
//! Writing aggregated scores into remote quality profiles

use crate::aggregate::{QualityProfileAggregate, ScoreAggregation};
use crate::error::{SyncError, SyncResult};
use crate::types::RemoteRecord;
use guidesync_config::ServiceConfiguration;
use guidesync_core::{RecordKind, RemoteApi, RemoteId};
use serde_json::{json, Value};
use std::collections::HashSet;

/// One score that differs from what the service holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreChange {
    pub format_id: i64,
    pub name: String,
    /// Previous score; `None` when the format was not listed at all
    pub from: Option<i32>,
    pub to: i32,
}

/// A quality profile document that needs to be sent back
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub profile: String,
    pub id: RemoteId,
    pub payload: Value,
    pub changes: Vec<ScoreChange>,
}

/// Outcome of the quality profile pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityProfileReport {
    pub updated: Vec<ProfileUpdate>,
    pub unchanged: Vec<String>,
    /// Configured profiles that do not exist in the service
    pub missing: Vec<String>,
}

/// Computes the score rewrite for one remote profile
///
/// Formats in the aggregate get their score; with `reset_unmatched` every
/// other format is set to 0. Formats the profile does not list yet are
/// appended. Returns `None` when nothing changes.
pub fn plan_profile_update(
    remote: &RemoteRecord,
    aggregate: &QualityProfileAggregate,
    reset_unmatched: bool,
) -> SyncResult<Option<ProfileUpdate>> {
    let invalid = |reason: String| SyncError::InvalidRemoteRecord {
        kind: RecordKind::QualityProfile,
        reason,
    };

    let mut payload = remote.payload.clone();
    let Value::Object(object) = &mut payload else {
        return Err(invalid(format!("profile {} is not an object", remote.id)));
    };
    let items = object
        .entry("formatItems")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(items) = items else {
        return Err(invalid(format!(
            "profile '{}' has a non-list 'formatItems'",
            remote.name
        )));
    };

    let mut changes = Vec::new();
    let mut listed = HashSet::new();

    for item in items.iter_mut() {
        let Some(format_id) = item.get("format").and_then(Value::as_i64) else {
            continue;
        };
        listed.insert(format_id);

        let current = item
            .get("score")
            .and_then(Value::as_i64)
            .and_then(|s| i32::try_from(s).ok());
        let target = match aggregate.scores.get(&format_id) {
            Some(entry) => Some(entry.score),
            None if reset_unmatched => Some(0),
            None => None,
        };

        if let Some(target) = target {
            if current != Some(target) {
                item["score"] = json!(target);
                changes.push(ScoreChange {
                    format_id,
                    name: item
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    from: current,
                    to: target,
                });
            }
        }
    }

    for (format_id, entry) in &aggregate.scores {
        if listed.contains(format_id) {
            continue;
        }
        items.push(json!({ "format": format_id, "name": entry.name, "score": entry.score }));
        changes.push(ScoreChange {
            format_id: *format_id,
            name: entry.name.clone(),
            from: None,
            to: entry.score,
        });
    }

    if changes.is_empty() {
        return Ok(None);
    }

    Ok(Some(ProfileUpdate {
        profile: remote.name.clone(),
        id: remote.id.clone(),
        payload,
        changes,
    }))
}

/// Applies aggregated scores to the instance's quality profiles
///
/// In preview mode the updates are computed but not sent.
pub async fn sync_quality_profiles(
    api: &dyn RemoteApi,
    config: &ServiceConfiguration,
    aggregation: &ScoreAggregation,
    preview: bool,
) -> SyncResult<QualityProfileReport> {
    let mut report = QualityProfileReport::default();
    if aggregation.is_empty() {
        log::debug!("No quality profile scores to apply");
        return Ok(report);
    }

    let kind = RecordKind::QualityProfile;
    let documents = api
        .get_records(kind)
        .await
        .map_err(|e| SyncError::remote("fetch", kind, "list", e))?;
    let remote = RemoteRecord::from_documents(kind, documents)?;

    for aggregate in &aggregation.profiles {
        let wanted = aggregate.name.to_lowercase();
        let Some(profile) = remote.iter().find(|p| p.name.to_lowercase() == wanted) else {
            log::warn!(
                "Quality profile '{}' does not exist in {}; its scores are skipped",
                aggregate.name,
                config.instance_name()
            );
            report.missing.push(aggregate.name.clone());
            continue;
        };

        let reset_unmatched = config
            .quality_profile(&aggregate.name)
            .is_some_and(|p| p.resets_unmatched_scores());

        match plan_profile_update(profile, aggregate, reset_unmatched)? {
            Some(update) => {
                if !preview {
                    api.update_record(kind, &update.id, &update.payload)
                        .await
                        .map_err(|e| {
                            log::error!(
                                "[{}] Failed to update quality profile '{}': {}",
                                config.instance_name(),
                                update.profile,
                                e
                            );
                            SyncError::remote(
                                "update",
                                kind,
                                format!("'{}' (id {})", update.profile, update.id),
                                e,
                            )
                        })?;
                    log::info!(
                        "Updated {} score(s) in quality profile '{}'",
                        update.changes.len(),
                        update.profile
                    );
                }
                report.updated.push(update);
            }
            None => {
                log::debug!("Quality profile '{}' is up to date", profile.name);
                report.unchanged.push(profile.name.clone());
            }
        }
    }

    Ok(report)
}
