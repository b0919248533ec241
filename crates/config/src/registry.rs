//! Locating, loading and filtering instance configurations
//!
//! The registry is the fail-fast gate in front of reconciliation: any
//! inconsistency that makes the set of instances ambiguous is reported here,
//! before a single remote call is issued.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::ConfigLoader;
use crate::service_config::{ServiceConfiguration, ServiceConfigurationBuilder};
use directories::ProjectDirs;
use guidesync_core::ServiceType;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Which configs and instances a command should operate on
#[derive(Debug, Clone, Default)]
pub struct ConfigFilterCriteria {
    /// Explicit config files; when empty the default locations are searched
    pub config_files: Vec<PathBuf>,
    /// Instance names to keep; when empty every instance is kept
    pub instances: Vec<String>,
    /// Restrict to one service type
    pub service: Option<ServiceType>,
}

/// Finds and loads instance configurations
pub struct ConfigRegistry {
    config_dir: PathBuf,
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("", "", "guidesync").ok_or_else(|| ConfigError::PathResolutionError {
        reason: "Could not determine user config directory".to_string(),
    })
}

/// Returns the default directory for the identity cache
///
/// - Linux: `~/.cache/guidesync/`
/// - macOS: `~/Library/Caches/guidesync/`
/// - Windows: `%LOCALAPPDATA%\guidesync\cache\`
pub fn default_cache_dir() -> ConfigResult<PathBuf> {
    Ok(project_dirs()?.cache_dir().to_path_buf())
}

impl ConfigRegistry {
    /// Creates a registry rooted at the platform config directory
    ///
    /// - Linux: `~/.config/guidesync/`
    /// - macOS: `~/Library/Application Support/guidesync/`
    /// - Windows: `%APPDATA%\guidesync\`
    pub fn new() -> ConfigResult<Self> {
        Ok(Self::with_directory(project_dirs()?.config_dir().to_path_buf()))
    }

    /// Creates a registry rooted at a custom directory
    pub fn with_directory(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Main config file: `<config_dir>/config.toml`
    pub fn default_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Additional config files: `<config_dir>/configs/*.toml`
    pub fn extra_configs_dir(&self) -> PathBuf {
        self.config_dir.join("configs")
    }

    /// Lists config files in the default locations, sorted by path
    pub fn find_config_files(&self) -> ConfigResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        let main = self.default_config_path();
        if main.is_file() {
            files.push(main);
        }

        let extra_dir = self.extra_configs_dir();
        if extra_dir.is_dir() {
            let entries = fs::read_dir(&extra_dir).map_err(|e| ConfigError::ReadError {
                path: extra_dir.clone(),
                source: e,
            })?;

            let mut extra: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
                .collect();
            extra.sort();
            files.extend(extra);
        }

        if files.is_empty() {
            return Err(ConfigError::NoConfigFiles(self.config_dir.clone()));
        }

        Ok(files)
    }

    /// Loads, checks and filters every instance according to `criteria`
    pub fn find_and_load(
        &self,
        criteria: &ConfigFilterCriteria,
    ) -> ConfigResult<Vec<ServiceConfiguration>> {
        let files = if criteria.config_files.is_empty() {
            self.find_config_files()?
        } else {
            prepare_manual_configs(&criteria.config_files)?
        };

        let mut loaded = Vec::new();
        for file in &files {
            loaded.extend(ConfigLoader::load_file(file)?);
        }

        load_and_filter(loaded, criteria)
    }
}

fn prepare_manual_configs(paths: &[PathBuf]) -> ConfigResult<Vec<PathBuf>> {
    let missing: Vec<PathBuf> = paths.iter().filter(|p| !p.is_file()).cloned().collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingConfigFiles(missing));
    }
    Ok(paths.to_vec())
}

/// Applies the registry checks to already-loaded builders
fn load_and_filter(
    loaded: Vec<ServiceConfigurationBuilder>,
    criteria: &ConfigFilterCriteria,
) -> ConfigResult<Vec<ServiceConfiguration>> {
    let invalid = invalid_instance_names(&loaded, criteria);
    if !invalid.is_empty() {
        return Err(ConfigError::InvalidInstances(invalid));
    }

    let duplicates = duplicate_instance_names(&loaded);
    if !duplicates.is_empty() {
        return Err(ConfigError::DuplicateInstances(duplicates));
    }

    let split = split_instance_names(&loaded);
    if !split.is_empty() {
        return Err(ConfigError::SplitInstances(split));
    }

    loaded
        .into_iter()
        .filter(|b| criteria.service.is_none_or(|s| s == b.service_type))
        .filter(|b| {
            criteria.instances.is_empty()
                || criteria
                    .instances
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(b.instance_name.as_str()))
        })
        .map(ServiceConfigurationBuilder::build)
        .collect()
}

fn invalid_instance_names(
    loaded: &[ServiceConfigurationBuilder],
    criteria: &ConfigFilterCriteria,
) -> Vec<String> {
    criteria
        .instances
        .iter()
        .filter(|name| {
            !loaded
                .iter()
                .any(|b| b.instance_name.as_str().eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect()
}

fn duplicate_instance_names(loaded: &[ServiceConfigurationBuilder]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for builder in loaded {
        *counts
            .entry(builder.instance_name.as_str().to_lowercase())
            .or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}

/// Instance names that point at a service another instance also manages
fn split_instance_names(loaded: &[ServiceConfigurationBuilder]) -> Vec<String> {
    let mut by_url: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for builder in loaded {
        by_url
            .entry(normalize_base_url(&builder.section.base_url))
            .or_default()
            .push(builder.instance_name.as_str().to_string());
    }

    by_url
        .into_values()
        .filter(|names| names.len() > 1)
        .flatten()
        .collect()
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}
