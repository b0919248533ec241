//! Integration tests for the configuration system

use guidesync_config::{ConfigError, ConfigFilterCriteria, ConfigRegistry};
use guidesync_core::ServiceType;
use std::fs;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[radarr.movies]
base_url = "http://radarr:7878/"
api_key = "radarr-key"
delete_old_custom_formats = true

[[radarr.movies.custom_formats]]
trash_ids = ["496f355514737f7d83bf7aa4d24f8169", "2f22d89048b01681dde8afe203bf2e95"]

[[radarr.movies.custom_formats.quality_profiles]]
name = "HD-1080p"
score = 500
reset_unmatched_scores = true

[[radarr.movies.custom_formats]]
trash_ids = ["dc98083864ea246d05a42df0d05f81cc"]

[[radarr.movies.custom_formats.quality_profiles]]
name = "hd-1080p"
reset_unmatched_scores = false

[[radarr.movies.quality_profiles]]
name = "Ultra-HD"
reset_unmatched_scores = false

[sonarr.series]
base_url = "https://sonarr.example"
api_key = "sonarr-key"

[[sonarr.series.release_profiles]]
trash_ids = ["EBC725268D687D588A20CBC5F97E538B"]
tags = ["tv"]
"#;

fn setup_registry(contents: &str) -> Result<(TempDir, ConfigRegistry), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("config.toml"), contents)?;
    let registry = ConfigRegistry::with_directory(temp_dir.path().to_path_buf());
    Ok((temp_dir, registry))
}

#[test]
fn test_full_load_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, registry) = setup_registry(FULL_CONFIG)?;

    let configs = registry.find_and_load(&ConfigFilterCriteria::default())?;
    assert_eq!(configs.len(), 2);

    let movies = &configs[0];
    assert_eq!(movies.service_type(), ServiceType::Radarr);
    assert_eq!(movies.base_url(), "http://radarr:7878");
    assert!(movies.delete_old_custom_formats());
    assert_eq!(movies.custom_format_keys().len(), 3);

    let series = &configs[1];
    assert_eq!(series.service_type(), ServiceType::Sonarr);
    assert_eq!(
        series.release_profiles()[0].trash_ids[0].as_str(),
        "ebc725268d687d588a20cbc5f97e538b"
    );

    Ok(())
}

#[test]
fn test_legacy_reset_flag_promoted_on_load() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, registry) = setup_registry(FULL_CONFIG)?;

    let criteria = ConfigFilterCriteria {
        instances: vec!["movies".to_string()],
        ..Default::default()
    };
    let configs = registry.find_and_load(&criteria)?;
    let movies = &configs[0];

    let promoted = movies
        .quality_profile("HD-1080P")
        .ok_or("profile should have been created")?;
    assert!(promoted.resets_unmatched_scores());

    let explicit = movies
        .quality_profile("ultra-hd")
        .ok_or("explicit profile missing")?;
    assert!(!explicit.resets_unmatched_scores());

    Ok(())
}

#[test]
fn test_validation_failure_aborts_load() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, registry) = setup_registry(
        r#"
[radarr.movies]
base_url = "radarr:7878"
api_key = ""
"#,
    )?;

    let result = registry.find_and_load(&ConfigFilterCriteria::default());
    match result {
        Err(ConfigError::ValidationError { instance, errors }) => {
            assert_eq!(instance, "movies");
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected validation error, got {:?}", other.map(|c| c.len())),
    }

    Ok(())
}

#[test]
fn test_manual_config_files_override_default_location() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, registry) = setup_registry("")?;
    let manual = temp_dir.path().join("elsewhere.toml");
    fs::write(
        &manual,
        "[sonarr.anime]\nbase_url = \"http://localhost:8989\"\napi_key = \"k\"\n",
    )?;

    let criteria = ConfigFilterCriteria {
        config_files: vec![manual.clone()],
        ..Default::default()
    };
    let configs = registry.find_and_load(&criteria)?;
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].instance_name().as_str(), "anime");
    assert_eq!(configs[0].source(), Some(&manual));

    Ok(())
}
