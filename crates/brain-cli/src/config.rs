//! Configuration loading and management.

use std::path::{Path, PathBuf};

use brain_core::{DEFAULT_STATE_KEY, EconomyConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Key the engine state is stored under.
    pub state_key: String,

    /// Economy tuning: multiplier bounds, streak weight and caps.
    #[serde(default)]
    pub economy: EconomyConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("brain.db"),
            state_key: DEFAULT_STATE_KEY.to_string(),
            economy: EconomyConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // BRAIN_DATABASE_PATH, BRAIN_ECONOMY__MAX_MULTIPLIER, ...
        figment = figment.merge(Env::prefixed("BRAIN_").split("__"));

        figment.extract()
    }

    /// Directory holding the database and its lock file.
    pub fn database_dir(&self) -> &Path {
        self.database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// Returns the platform-specific config directory for brain.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("brain"))
}

/// Returns the platform-specific data directory for brain.
///
/// On Linux: `~/.local/share/brain`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("brain"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_brain() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "brain");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("brain.db"));
        assert_eq!(config.state_key, DEFAULT_STATE_KEY);
        assert_eq!(config.economy, EconomyConfig::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/other.db\"\n\n[economy]\nmax_multiplier = 3.0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert!((config.economy.max_multiplier - 3.0).abs() < f64::EPSILON);
        assert!((config.economy.min_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.state_key, DEFAULT_STATE_KEY);
    }

    #[test]
    fn test_database_dir_of_bare_file_name() {
        let config = Config {
            database_path: PathBuf::from("brain.db"),
            ..Config::default()
        };
        assert_eq!(config.database_dir(), Path::new("."));
    }
}
