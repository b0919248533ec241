//! Per-instance desired-state configuration
//!
//! A TOML table such as `[radarr.movies]` deserializes into a
//! [`ServiceSection`]. The loader wraps it in a [`ServiceConfigurationBuilder`],
//! the only mutable stage, and `build()` validates it, runs the legacy
//! migration pass and seals it into an immutable [`ServiceConfiguration`].

use crate::error::{ConfigError, ConfigResult};
use crate::migration::migrate_legacy_overrides;
use crate::validation::{ConfigSection, ValidationError, Validator};
use guidesync_core::{ContentKey, InstanceName, ServiceType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Score assignment of a group of custom formats within one quality profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityProfileScoreConfig {
    /// Quality profile name (matched case-insensitively)
    pub name: String,

    /// Explicit score; falls back to the guide's default score when absent
    pub score: Option<i32>,

    /// Deprecated per-reference form of
    /// [`QualityProfileConfig::reset_unmatched_scores`]
    pub reset_unmatched_scores: Option<bool>,
}

/// A group of guide custom formats to synchronize
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomFormatConfig {
    pub trash_ids: Vec<ContentKey>,
    pub quality_profiles: Vec<QualityProfileScoreConfig>,
}

/// Profile-level settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityProfileConfig {
    pub name: String,

    /// Reset scores of formats not referenced by the config to zero
    pub reset_unmatched_scores: Option<bool>,
}

impl QualityProfileConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reset_unmatched_scores: None,
        }
    }

    /// Returns true if unmatched scores should be reset for this profile
    pub fn resets_unmatched_scores(&self) -> bool {
        self.reset_unmatched_scores.unwrap_or(false)
    }
}

/// Guide release profiles to synchronize (Sonarr only)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseProfileConfig {
    pub trash_ids: Vec<ContentKey>,

    /// Tag labels to attach; missing tags are created
    pub tags: Vec<String>,
}

/// Raw contents of one instance table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
    pub base_url: String,
    pub api_key: String,

    /// Delete custom formats this tool created that the config no longer lists
    pub delete_old_custom_formats: bool,

    pub custom_formats: Vec<CustomFormatConfig>,
    pub quality_profiles: Vec<QualityProfileConfig>,
    pub release_profiles: Vec<ReleaseProfileConfig>,
}

impl ConfigSection for ServiceSection {
    fn validate(&self, path: &str) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::http_url(&self.base_url, &format!("{}.base_url", path)),
            Validator::not_empty(&self.api_key, &format!("{}.api_key", path)),
        ];

        for (i, cf) in self.custom_formats.iter().enumerate() {
            let cf_path = format!("{}.custom_formats[{}]", path, i);
            results.push(Validator::not_empty_list(
                &cf.trash_ids,
                &format!("{}.trash_ids", cf_path),
            ));
            for (j, profile) in cf.quality_profiles.iter().enumerate() {
                results.push(Validator::not_empty(
                    &profile.name,
                    &format!("{}.quality_profiles[{}].name", cf_path, j),
                ));
            }
        }

        for (i, profile) in self.quality_profiles.iter().enumerate() {
            results.push(Validator::not_empty(
                &profile.name,
                &format!("{}.quality_profiles[{}].name", path, i),
            ));
        }

        for (i, rp) in self.release_profiles.iter().enumerate() {
            results.push(Validator::not_empty_list(
                &rp.trash_ids,
                &format!("{}.release_profiles[{}].trash_ids", path, i),
            ));
        }

        Validator::collect_errors(results)
    }
}

/// Mutable stage of an instance configuration
///
/// Exists only between loading and [`build`](Self::build).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfigurationBuilder {
    pub instance_name: InstanceName,
    pub service_type: ServiceType,
    pub section: ServiceSection,
    /// File the instance was declared in, if loaded from disk
    pub source: Option<PathBuf>,
}

impl ServiceConfigurationBuilder {
    pub fn new(instance_name: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            instance_name: InstanceName::new(instance_name),
            service_type,
            section: ServiceSection::default(),
            source: None,
        }
    }

    pub fn with_section(mut self, section: ServiceSection) -> Self {
        self.section = section;
        self
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    /// Validates, migrates legacy settings and seals the configuration
    pub fn build(self) -> ConfigResult<ServiceConfiguration> {
        let mut errors = Vec::new();
        if let Err(mut e) = self.section.validate(self.instance_name.as_str()) {
            errors.append(&mut e);
        }

        if !self.service_type.supports_release_profiles() && !self.section.release_profiles.is_empty()
        {
            errors.push(ValidationError::with_value(
                format!("{}.release_profiles", self.instance_name),
                "release profiles are only supported by Sonarr",
                self.service_type,
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationError {
                instance: self.instance_name.to_string(),
                errors,
            });
        }

        let migrated = migrate_legacy_overrides(self);
        Ok(ServiceConfiguration {
            instance_name: migrated.instance_name,
            service_type: migrated.service_type,
            section: migrated.section,
            source: migrated.source,
        })
    }
}

/// Validated, immutable configuration of one service instance
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfiguration {
    instance_name: InstanceName,
    service_type: ServiceType,
    section: ServiceSection,
    source: Option<PathBuf>,
}

impl ServiceConfiguration {
    pub fn instance_name(&self) -> &InstanceName {
        &self.instance_name
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn base_url(&self) -> &str {
        self.section.base_url.trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        &self.section.api_key
    }

    pub fn delete_old_custom_formats(&self) -> bool {
        self.section.delete_old_custom_formats
    }

    pub fn custom_formats(&self) -> &[CustomFormatConfig] {
        &self.section.custom_formats
    }

    pub fn quality_profiles(&self) -> &[QualityProfileConfig] {
        &self.section.quality_profiles
    }

    pub fn release_profiles(&self) -> &[ReleaseProfileConfig] {
        &self.section.release_profiles
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    /// Finds the profile-level settings for `name`, ignoring case
    pub fn quality_profile(&self, name: &str) -> Option<&QualityProfileConfig> {
        self.section
            .quality_profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// All referenced custom format keys, deduplicated, in declaration order
    pub fn custom_format_keys(&self) -> Vec<ContentKey> {
        let mut keys: Vec<ContentKey> = Vec::new();
        for key in self.section.custom_formats.iter().flat_map(|cf| &cf.trash_ids) {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}
