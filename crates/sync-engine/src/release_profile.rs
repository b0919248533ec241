// crates/sync-engine/src/release_profile.rs
//! Sonarr release profiles
//!
//! Profiles created here are titled `[Trash] <guide name>`. The prefix marks
//! them as managed: a prefixed profile that no longer corresponds to a
//! selected guide profile is deleted.

use crate::error::{SyncError, SyncResult};
use guidesync_config::ServiceConfiguration;
use guidesync_core::{RecordKind, RemoteApi, RemoteId};
use guidesync_guide::{ReleaseProfileData, TermData};
use serde_json::{json, Value};

const TITLE_PREFIX: &str = "[Trash]";

/// A guide release profile chosen by the config, with its tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedReleaseProfile {
    pub profile: ReleaseProfileData,
    pub tags: Vec<String>,
}

/// Outcome of the release profile pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseProfileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub tags_created: Vec<String>,
}

/// Remote title of a managed profile
pub fn profile_title(name: &str) -> String {
    format!("{TITLE_PREFIX} {name}")
}

/// Picks the guide profiles referenced by the config
pub fn select_release_profiles(
    config: &ServiceConfiguration,
    guide: &[ReleaseProfileData],
) -> Vec<SelectedReleaseProfile> {
    let mut selected = Vec::new();

    for entry in config.release_profiles() {
        for key in &entry.trash_ids {
            match guide.iter().find(|p| &p.trash_id == key) {
                Some(profile) => {
                    log::debug!("Found release profile: {} ({})", profile.name, profile.trash_id);
                    selected.push(SelectedReleaseProfile {
                        profile: profile.clone(),
                        tags: entry.tags.clone(),
                    });
                }
                None => log::warn!("A release profile with trash id {} does not exist", key),
            }
        }
    }

    selected
}

fn terms(terms: &[TermData]) -> Value {
    Value::Array(terms.iter().map(|t| json!(t.term)).collect())
}

/// Builds the document to send for one profile
///
/// `existing` is the remote profile being replaced; its other fields (such
/// as `indexerId`) are preserved.
pub fn build_payload(
    existing: Option<&Value>,
    profile: &ReleaseProfileData,
    tag_ids: &[i64],
) -> Value {
    let mut payload = match existing {
        Some(Value::Object(object)) => Value::Object(object.clone()),
        _ => json!({ "name": profile_title(&profile.name), "enabled": true }),
    };

    let preferred: Vec<Value> = profile
        .preferred
        .iter()
        .flat_map(|group| {
            group
                .terms
                .iter()
                .map(move |t| json!({ "key": t.term, "value": group.score }))
        })
        .collect();

    payload["required"] = terms(&profile.required);
    payload["ignored"] = terms(&profile.ignored);
    payload["preferred"] = Value::Array(preferred);
    payload["includePreferredWhenRenaming"] = json!(profile.include_preferred_when_renaming);
    payload["tags"] = json!(tag_ids);
    payload
}

fn name_of(doc: &Value) -> String {
    doc.get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn label_of(tag: &Value) -> Option<&str> {
    tag.get("label").and_then(Value::as_str)
}

/// Resolves tag labels to ids, creating tags the service does not have
///
/// In preview mode missing tags are reported but not created.
pub async fn resolve_tags(
    api: &dyn RemoteApi,
    labels: &[String],
    preview: bool,
    created: &mut Vec<String>,
) -> SyncResult<Vec<i64>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let kind = RecordKind::Tag;
    let mut tags = api
        .get_records(kind)
        .await
        .map_err(|e| SyncError::remote("fetch", kind, "list", e))?;

    for label in labels {
        let exists = tags
            .iter()
            .any(|t| label_of(t).is_some_and(|l| l.eq_ignore_ascii_case(label)));
        if exists || created.iter().any(|c| c.eq_ignore_ascii_case(label)) {
            continue;
        }

        log::debug!("Creating tag: {}", label);
        created.push(label.clone());
        if !preview {
            let tag = api
                .create_record(kind, &json!({ "label": label }))
                .await
                .map_err(|e| SyncError::remote("create", kind, format!("'{label}'"), e))?;
            tags.push(tag);
        }
    }

    Ok(labels
        .iter()
        .filter_map(|label| {
            tags.iter()
                .find(|t| label_of(t).is_some_and(|l| l.eq_ignore_ascii_case(label)))
                .and_then(|t| t.get("id"))
                .and_then(Value::as_i64)
        })
        .collect())
}

/// Creates, updates and prunes managed release profiles
pub async fn sync_release_profiles(
    api: &dyn RemoteApi,
    selected: &[SelectedReleaseProfile],
    preview: bool,
) -> SyncResult<ReleaseProfileReport> {
    let kind = RecordKind::ReleaseProfile;
    let mut report = ReleaseProfileReport::default();

    let existing = api
        .get_records(kind)
        .await
        .map_err(|e| SyncError::remote("fetch", kind, "list", e))?;

    for entry in selected {
        let tag_ids = resolve_tags(api, &entry.tags, preview, &mut report.tags_created).await?;
        let title = profile_title(&entry.profile.name);

        match existing.iter().find(|doc| name_of(doc) == title) {
            Some(current) => {
                let id = RemoteId::from_document(current).ok_or_else(|| {
                    SyncError::InvalidRemoteRecord {
                        kind,
                        reason: format!("'{title}' has no 'id'"),
                    }
                })?;
                let payload = build_payload(Some(current), &entry.profile, &tag_ids);
                if !preview {
                    api.update_record(kind, &id, &payload).await.map_err(|e| {
                        SyncError::remote("update", kind, format!("'{title}' (id {id})"), e)
                    })?;
                    log::info!("Update existing profile: {}", title);
                }
                report.updated.push(title);
            }
            None => {
                let payload = build_payload(None, &entry.profile, &tag_ids);
                if !preview {
                    api.create_record(kind, &payload)
                        .await
                        .map_err(|e| SyncError::remote("create", kind, format!("'{title}'"), e))?;
                    log::info!("Create new profile: {}", title);
                }
                report.created.push(title);
            }
        }
    }

    for doc in &existing {
        let name = name_of(doc);
        let lowered = name.to_lowercase();
        let managed = lowered.starts_with(&TITLE_PREFIX.to_lowercase());
        let still_selected = selected
            .iter()
            .any(|s| lowered.ends_with(&s.profile.name.to_lowercase()));
        if !managed || still_selected {
            continue;
        }

        let Some(id) = RemoteId::from_document(doc) else {
            continue;
        };
        if !preview {
            api.delete_record(kind, &id).await.map_err(|e| {
                SyncError::remote("delete", kind, format!("'{name}' (id {id})"), e)
            })?;
            log::info!("Deleting old Trash release profile: {}", name);
        }
        report.deleted.push(name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidesync_guide::PreferredTermData;

    fn guide_profile() -> ReleaseProfileData {
        ReleaseProfileData {
            trash_id: "r1".into(),
            name: "Sources".to_string(),
            include_preferred_when_renaming: true,
            required: vec![TermData {
                trash_id: None,
                name: None,
                term: "/req/".to_string(),
            }],
            ignored: vec![],
            preferred: vec![PreferredTermData {
                score: 100,
                terms: vec![
                    TermData {
                        trash_id: None,
                        name: Some("A".to_string()),
                        term: "/a/".to_string(),
                    },
                    TermData {
                        trash_id: None,
                        name: None,
                        term: "/b/".to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_profile_title() {
        assert_eq!(profile_title("Sources"), "[Trash] Sources");
    }

    #[test]
    fn test_new_payload() {
        let payload = build_payload(None, &guide_profile(), &[3]);
        assert_eq!(
            payload,
            json!({
                "name": "[Trash] Sources",
                "enabled": true,
                "required": ["/req/"],
                "ignored": [],
                "preferred": [{ "key": "/a/", "value": 100 }, { "key": "/b/", "value": 100 }],
                "includePreferredWhenRenaming": true,
                "tags": [3]
            })
        );
    }

    #[test]
    fn test_update_payload_keeps_remote_fields() {
        let existing = json!({ "id": 4, "name": "[Trash] Sources", "enabled": false, "indexerId": 2 });
        let payload = build_payload(Some(&existing), &guide_profile(), &[]);
        assert_eq!(payload["id"], json!(4));
        assert_eq!(payload["indexerId"], json!(2));
        assert_eq!(payload["enabled"], json!(false));
        assert_eq!(payload["tags"], json!([]));
    }
}
