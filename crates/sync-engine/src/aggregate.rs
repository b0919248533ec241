// crates/sync-engine/src/aggregate.rs
//! Per-profile custom format scores
//!
//! Every (quality profile, custom format) pair in the config contributes at
//! most one score. A format listed twice for the same profile keeps the
//! first score seen; a different later score is reported as a conflict.

use crate::guide_index::GuideIndex;
use guidesync_config::ServiceConfiguration;
use guidesync_core::ContentKey;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// One config reference of a custom format from a quality profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAssociation {
    pub profile: String,
    pub trash_id: ContentKey,
    /// Explicit score; the guide default applies when absent
    pub score: Option<i32>,
}

/// Score assigned to one format within a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatScore {
    pub trash_id: ContentKey,
    pub name: String,
    pub score: i32,
}

/// Final scores for one quality profile, keyed by numeric format id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityProfileAggregate {
    /// Profile name as first written in the config
    pub name: String,
    pub scores: BTreeMap<i64, FormatScore>,
}

impl QualityProfileAggregate {
    pub fn score_for(&self, format_id: i64) -> Option<i32> {
        self.scores.get(&format_id).map(|s| s.score)
    }
}

/// A format scored differently twice within one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreConflict {
    pub profile: String,
    pub trash_id: ContentKey,
    pub name: String,
    pub kept: i32,
    pub rejected: i32,
}

/// Result of the aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreAggregation {
    /// Profiles with at least one score, in order of first reference
    pub profiles: Vec<QualityProfileAggregate>,
    pub conflicts: Vec<ScoreConflict>,
}

impl ScoreAggregation {
    /// Finds a profile by case-insensitive name
    pub fn get(&self, profile: &str) -> Option<&QualityProfileAggregate> {
        let wanted = profile.to_lowercase();
        self.profiles
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Lists every profile/format pair in config order
///
/// Order: custom format group, then profile within the group, then content
/// key within the group.
pub fn profile_associations(config: &ServiceConfiguration) -> Vec<ProfileAssociation> {
    config
        .custom_formats()
        .iter()
        .flat_map(|group| {
            group.quality_profiles.iter().flat_map(move |profile| {
                group.trash_ids.iter().map(move |key| ProfileAssociation {
                    profile: profile.name.clone(),
                    trash_id: key.clone(),
                    score: profile.score,
                })
            })
        })
        .collect()
}

/// Computes per-profile scores from config references and the guide
pub fn aggregate_scores(associations: &[ProfileAssociation], index: &GuideIndex) -> ScoreAggregation {
    let mut profiles: Vec<QualityProfileAggregate> = Vec::new();
    let mut conflicts = Vec::new();

    for association in associations {
        let Some(format) = index.get(&association.trash_id) else {
            log::info!(
                "Quality profile {} references unknown custom format {}; skipping",
                association.profile,
                association.trash_id
            );
            continue;
        };

        let Some(score) = association.score.or(format.default_score) else {
            log::info!(
                "No score in guide or config for custom format {} ({})",
                format.name,
                format.trash_id
            );
            continue;
        };

        let Some(format_id) = format.remote_id else {
            log::info!(
                "Custom format {} ({}) does not exist in the service yet; its score for {} is skipped",
                format.name,
                format.trash_id,
                association.profile
            );
            continue;
        };

        let wanted = association.profile.to_lowercase();
        let position = match profiles.iter().position(|p| p.name.to_lowercase() == wanted) {
            Some(position) => position,
            None => {
                profiles.push(QualityProfileAggregate {
                    name: association.profile.clone(),
                    scores: BTreeMap::new(),
                });
                profiles.len() - 1
            }
        };
        let aggregate = &mut profiles[position];

        match aggregate.scores.entry(format_id) {
            Entry::Vacant(slot) => {
                slot.insert(FormatScore {
                    trash_id: format.trash_id.clone(),
                    name: format.name.clone(),
                    score,
                });
            }
            Entry::Occupied(existing) if existing.get().score == score => {
                log::debug!(
                    "Skipping duplicate score for {} ({}) in {}",
                    format.name,
                    format.trash_id,
                    aggregate.name
                );
            }
            Entry::Occupied(existing) => {
                let kept = existing.get().score;
                log::warn!(
                    "Custom format {} ({}) is duplicated in quality profile {} with a score of {}, \
                     which is different from the original score of {}",
                    format.name,
                    format.trash_id,
                    aggregate.name,
                    score,
                    kept
                );
                conflicts.push(ScoreConflict {
                    profile: aggregate.name.clone(),
                    trash_id: format.trash_id.clone(),
                    name: format.name.clone(),
                    kept,
                    rejected: score,
                });
            }
        }
    }

    ScoreAggregation {
        profiles,
        conflicts,
    }
}
