//! guidesync configuration
//!
//! Loads the desired-state declarations for every configured service
//! instance from TOML files and turns them into validated, immutable
//! [`ServiceConfiguration`] values.
//!
//! # Architecture
//!
//! - **Loader**: parses `[radarr.<name>]` / `[sonarr.<name>]` tables
//! - **Registry**: finds files, rejects split or unknown instances, filters
//! - **Builder stage**: the only mutable form; runs the legacy migration pass
//!   before sealing
//!
//! # Example
//!
//! ```rust
//! use guidesync_config::ConfigLoader;
//!
//! let toml = r#"
//! [radarr.movies]
//! base_url = "http://localhost:7878"
//! api_key = "secret"
//!
//! [[radarr.movies.custom_formats]]
//! trash_ids = ["496f355514737f7d83bf7aa4d24f8169"]
//! "#;
//!
//! let builders = ConfigLoader::load_str(toml, None).unwrap();
//! let config = builders.into_iter().next().unwrap().build().unwrap();
//! assert_eq!(config.instance_name().as_str(), "movies");
//! ```

mod error;
mod loader;
mod migration;
mod registry;
mod service_config;
mod validation;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use loader::{ConfigFile, ConfigLoader};
pub use migration::migrate_legacy_overrides;
pub use registry::{default_cache_dir, ConfigFilterCriteria, ConfigRegistry};
pub use service_config::{
    CustomFormatConfig, QualityProfileConfig, QualityProfileScoreConfig, ReleaseProfileConfig,
    ServiceConfiguration, ServiceConfigurationBuilder, ServiceSection,
};
pub use validation::{ConfigSection, Validator};
