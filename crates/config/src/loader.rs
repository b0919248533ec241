//! Reading config files from disk
//!
//! A file holds any number of instances, keyed by service type:
//!
//! ```toml
//! [radarr.movies]
//! base_url = "http://localhost:7878"
//! api_key = "..."
//!
//! [sonarr.series]
//! base_url = "http://localhost:8989"
//! api_key = "..."
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::service_config::{ServiceConfigurationBuilder, ServiceSection};
use guidesync_core::ServiceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root structure of one config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub radarr: BTreeMap<String, ServiceSection>,
    pub sonarr: BTreeMap<String, ServiceSection>,
}

impl ConfigFile {
    /// Converts every instance table into a builder
    pub fn into_builders(self, source: Option<&Path>) -> Vec<ServiceConfigurationBuilder> {
        let radarr = self
            .radarr
            .into_iter()
            .map(|(name, section)| (name, ServiceType::Radarr, section));
        let sonarr = self
            .sonarr
            .into_iter()
            .map(|(name, section)| (name, ServiceType::Sonarr, section));

        radarr
            .chain(sonarr)
            .map(|(name, service, section)| {
                let builder = ServiceConfigurationBuilder::new(name, service).with_section(section);
                match source {
                    Some(path) => builder.with_source(path.to_path_buf()),
                    None => builder,
                }
            })
            .collect()
    }
}

/// Parses config files into instance builders
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads every instance declared in one file
    pub fn load_file(path: &Path) -> ConfigResult<Vec<ServiceConfigurationBuilder>> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            log::warn!("Config file {} is empty; no instances loaded", path.display());
            return Ok(Vec::new());
        }

        let builders = Self::load_str(&contents, Some(path))?;
        log::debug!(
            "Loaded {} instance(s) from {}",
            builders.len(),
            path.display()
        );
        Ok(builders)
    }

    /// Parses config text; `path` is used for error context and provenance
    pub fn load_str(
        contents: &str,
        path: Option<&Path>,
    ) -> ConfigResult<Vec<ServiceConfigurationBuilder>> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("<memory>")),
            source: e,
        })?;

        Ok(file.into_builders(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[radarr.movies]
base_url = "http://localhost:7878"
api_key = "abc"
delete_old_custom_formats = true

[[radarr.movies.custom_formats]]
trash_ids = ["A1", "b2"]

[[radarr.movies.custom_formats.quality_profiles]]
name = "HD"
score = 100

[sonarr.series]
base_url = "http://localhost:8989"
api_key = "def"

[[sonarr.series.release_profiles]]
trash_ids = ["r1"]
tags = ["anime"]
"#;

    #[test]
    fn test_load_str_reads_both_services() {
        let builders = ConfigLoader::load_str(SAMPLE, None).unwrap();
        assert_eq!(builders.len(), 2);

        let movies = &builders[0];
        assert_eq!(movies.instance_name.as_str(), "movies");
        assert_eq!(movies.service_type, ServiceType::Radarr);
        assert!(movies.section.delete_old_custom_formats);
        assert_eq!(movies.section.custom_formats[0].trash_ids[0].as_str(), "a1");
        assert_eq!(
            movies.section.custom_formats[0].quality_profiles[0].score,
            Some(100)
        );

        let series = &builders[1];
        assert_eq!(series.service_type, ServiceType::Sonarr);
        assert_eq!(series.section.release_profiles[0].tags, vec!["anime"]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ConfigLoader::load_str("[radarr.movies]\nbase_ulr = \"x\"\n", None);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_file_records_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let builders = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(builders[0].source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::load_file(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_empty_file_yields_no_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n").unwrap();
        assert!(ConfigLoader::load_file(&path).unwrap().is_empty());
    }
}
