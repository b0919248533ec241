//! Legacy configuration migration
//!
//! `reset_unmatched_scores` used to be set on each
//! `custom_formats[*].quality_profiles[*]` entry. It now lives on the
//! top-level `quality_profiles` entry. This pass promotes the old form to the
//! new one without overriding anything the user already set explicitly.

use crate::service_config::{QualityProfileConfig, ServiceConfigurationBuilder};

/// Promotes deprecated per-reference `reset_unmatched_scores` flags to
/// profile-level settings.
///
/// A `true` legacy flag creates the profile-level entry if none exists, or
/// sets its flag if it was unset. Explicit profile-level values are never
/// overwritten. The legacy flags themselves are left in place.
pub fn migrate_legacy_overrides(mut builder: ServiceConfigurationBuilder) -> ServiceConfigurationBuilder {
    let legacy: Vec<(String, bool)> = builder
        .section
        .custom_formats
        .iter()
        .flat_map(|cf| &cf.quality_profiles)
        .filter_map(|p| p.reset_unmatched_scores.map(|flag| (p.name.clone(), flag)))
        .collect();

    if legacy.is_empty() {
        return builder;
    }

    log::warn!(
        "DEPRECATION: Support for using `reset_unmatched_scores` under `custom_formats.quality_profiles` \
         will be removed in a future release. Move it to the top level `quality_profiles` instead \
         (instance: {})",
        builder.instance_name
    );

    let mut promoted: Vec<String> = Vec::new();
    for (name, _) in legacy.into_iter().filter(|(_, flag)| *flag) {
        if promoted.iter().any(|p| p.eq_ignore_ascii_case(&name)) {
            continue;
        }

        let profiles = &mut builder.section.quality_profiles;
        match profiles.iter_mut().find(|p| p.name.eq_ignore_ascii_case(&name)) {
            None => {
                log::debug!(
                    "Root-level quality profile created to promote reset_unmatched_scores from CF score config: {}",
                    name
                );
                profiles.push(QualityProfileConfig {
                    name: name.clone(),
                    reset_unmatched_scores: Some(true),
                });
            }
            Some(existing) if existing.reset_unmatched_scores.is_none() => {
                log::debug!(
                    "Score-based reset_unmatched_scores propagated to existing root-level quality profile config: {}",
                    name
                );
                existing.reset_unmatched_scores = Some(true);
            }
            Some(_) => {}
        }

        promoted.push(name);
    }

    builder
}
