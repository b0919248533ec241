//! Parsed guide records

use crate::{GuideError, GuideResult};
use guidesync_core::ContentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A custom format as published by the guide
#[derive(Debug, Clone, PartialEq)]
pub struct GuideCustomFormat {
    pub trash_id: ContentKey,
    pub name: String,
    /// Score the guide recommends when the config gives none
    pub default_score: Option<i32>,
    /// Service-facing document, with every `trash_*` key removed
    pub payload: Value,
}

impl GuideCustomFormat {
    /// Builds a custom format from a raw guide document
    ///
    /// The default score is read from `trash_scores.default`, falling back
    /// to the older `trash_score` field.
    pub fn from_document(document: Value) -> GuideResult<Self> {
        let Value::Object(object) = document else {
            return Err(GuideError::Malformed("document is not a JSON object".to_string()));
        };

        let trash_id = object
            .get("trash_id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or(GuideError::MissingField("trash_id"))?;

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or(GuideError::MissingField("name"))?
            .to_string();

        let default_score = object
            .get("trash_scores")
            .and_then(|scores| scores.get("default"))
            .or_else(|| object.get("trash_score"))
            .and_then(Value::as_i64)
            .and_then(|score| i32::try_from(score).ok());

        let trash_id = ContentKey::from(trash_id);
        let payload: Map<String, Value> = object
            .into_iter()
            .filter(|(key, _)| !key.starts_with("trash_"))
            .collect();

        Ok(Self {
            trash_id,
            name,
            default_score,
            payload: Value::Object(payload),
        })
    }
}

/// A single release profile term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub term: String,
}

/// A group of preferred terms sharing one score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredTermData {
    pub score: i32,
    #[serde(default)]
    pub terms: Vec<TermData>,
}

/// A Sonarr release profile as published by the guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseProfileData {
    #[serde(rename = "trash_id")]
    pub trash_id: ContentKey,
    pub name: String,
    #[serde(default)]
    pub include_preferred_when_renaming: bool,
    #[serde(default)]
    pub required: Vec<TermData>,
    #[serde(default)]
    pub ignored: Vec<TermData>,
    #[serde(default)]
    pub preferred: Vec<PreferredTermData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_custom_format_strips_guide_fields() {
        let cf = GuideCustomFormat::from_document(json!({
            "trash_id": "ABC",
            "trash_scores": { "default": 150, "anime": 10 },
            "name": "Remux",
            "includeCustomFormatWhenRenaming": false,
            "specifications": []
        }))
        .unwrap();

        assert_eq!(cf.trash_id.as_str(), "abc");
        assert_eq!(cf.name, "Remux");
        assert_eq!(cf.default_score, Some(150));
        assert_eq!(
            cf.payload,
            json!({
                "name": "Remux",
                "includeCustomFormatWhenRenaming": false,
                "specifications": []
            })
        );
    }

    #[test]
    fn test_custom_format_legacy_score_field() {
        let cf = GuideCustomFormat::from_document(json!({
            "trash_id": "a",
            "trash_score": -1000,
            "name": "BR-DISK"
        }))
        .unwrap();
        assert_eq!(cf.default_score, Some(-1000));
    }

    #[test]
    fn test_custom_format_without_score() {
        let cf = GuideCustomFormat::from_document(json!({ "trash_id": "a", "name": "x" })).unwrap();
        assert_eq!(cf.default_score, None);
    }

    #[test]
    fn test_custom_format_requires_identity() {
        assert!(matches!(
            GuideCustomFormat::from_document(json!({ "name": "x" })),
            Err(GuideError::MissingField("trash_id"))
        ));
        assert!(matches!(
            GuideCustomFormat::from_document(json!({ "trash_id": "a", "name": " " })),
            Err(GuideError::MissingField("name"))
        ));
        assert!(matches!(
            GuideCustomFormat::from_document(json!([1, 2])),
            Err(GuideError::Malformed(_))
        ));
    }

    #[test]
    fn test_release_profile_deserializes() {
        let rp: ReleaseProfileData = serde_json::from_value(json!({
            "trash_id": "EBC7",
            "name": "Release Sources",
            "includePreferredWhenRenaming": true,
            "required": [{ "term": "/x264/i" }],
            "preferred": [{ "score": 100, "terms": [{ "name": "Good", "term": "/good/" }] }]
        }))
        .unwrap();

        assert_eq!(rp.trash_id.as_str(), "ebc7");
        assert!(rp.include_preferred_when_renaming);
        assert_eq!(rp.required.len(), 1);
        assert!(rp.ignored.is_empty());
        assert_eq!(rp.preferred[0].terms[0].name.as_deref(), Some("Good"));
    }
}
