//! Configuration: repository locations, layout and drag preferences.
//!
//! Loaded from a TOML file, with environment variable overrides for the
//! extra repository list so a studio can point every seat at shared
//! script repositories without touching per-user config files.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::reorder::DragZoneConfig;
use crate::repository::Repository;
use crate::resolve::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable listing extra repository roots, `:`-separated
/// (`;` on Windows).
pub const ENV_REPO_PATHS: &str = "HOTBOX_REPO_PATHS";

/// Environment variable listing the display names for the extra
/// repositories, matched to the paths by position.
pub const ENV_REPO_NAMES: &str = "HOTBOX_REPO_NAMES";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotboxConfig {
    /// Root folder of the local repository.
    #[serde(default = "default_location")]
    pub location: PathBuf,

    /// Extra, read-mostly repositories merged into resolution.
    #[serde(default)]
    pub extra_repositories: Vec<ExtraRepository>,

    /// Row layout preferences.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Drag zone geometry.
    #[serde(default)]
    pub drag: DragZoneConfig,

    /// File suffix of stored scripts.
    #[serde(default = "default_script_suffix")]
    pub script_suffix: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One configured extra repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraRepository {
    pub name: String,
    pub path: PathBuf,
}

fn default_location() -> PathBuf {
    PathBuf::from(".hotbox")
}

fn default_script_suffix() -> String {
    ".py".to_string()
}

impl Default for HotboxConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            extra_repositories: Vec::new(),
            layout: LayoutConfig::default(),
            drag: DragZoneConfig::default(),
            script_suffix: default_script_suffix(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HotboxConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let mut config: HotboxConfig = toml::from_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no config file
    /// exists.
    pub fn from_env() -> Self {
        let mut config = HotboxConfig::default();
        config.apply_env_overrides();
        config
    }

    /// Fold `HOTBOX_REPO_PATHS` / `HOTBOX_REPO_NAMES` into the extra
    /// repository list. Paths without a name at the same position fall
    /// back to their folder name; duplicate names or paths are dropped.
    pub fn apply_env_overrides(&mut self) {
        let paths = match std::env::var_os(ENV_REPO_PATHS) {
            Some(paths) => paths,
            None => return,
        };
        let names: Vec<String> = std::env::var(ENV_REPO_NAMES)
            .map(|value| value.split(':').map(str::to_string).collect())
            .unwrap_or_default();

        for (index, path) in std::env::split_paths(&paths).enumerate() {
            if path.as_os_str().is_empty() {
                continue;
            }
            let name = names
                .get(index)
                .filter(|name| !name.is_empty())
                .cloned()
                .or_else(|| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                });
            let name = match name {
                Some(name) => name,
                None => continue,
            };

            let duplicate = self
                .extra_repositories
                .iter()
                .any(|extra| extra.name == name || extra.path == path);
            if duplicate {
                warn!(name = %name, path = %path.display(), "duplicate extra repository ignored");
                continue;
            }
            self.extra_repositories.push(ExtraRepository { name, path });
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "Repository location cannot be empty".to_string(),
            ));
        }
        if !self.script_suffix.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "Script suffix must start with '.': {:?}",
                self.script_suffix
            )));
        }
        for extra in &self.extra_repositories {
            if extra.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Extra repository {:?} has an empty name",
                    extra.path
                )));
            }
        }
        Ok(())
    }

    /// The active repository set: the local one first, extras after, in
    /// configured order.
    pub fn repositories(&self) -> Vec<Repository> {
        let mut repositories = vec![Repository::local(&self.location)];
        repositories.extend(
            self.extra_repositories
                .iter()
                .map(|extra| Repository::named(&extra.name, &extra.path)),
        );
        repositories
    }
}
