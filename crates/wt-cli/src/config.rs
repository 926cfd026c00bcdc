//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// CLI flags override these values; the file and environment only supply
/// defaults for flags the user did not pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for log files when none are given explicitly.
    pub logs_dir: PathBuf,
    /// Default inactivity threshold in minutes.
    pub inactivity_minutes: f64,
    /// Default minimum-hours filter (0 = no filter).
    pub min_hours: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            inactivity_minutes: 30.0,
            min_hours: 0.0,
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

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WT_*)
        figment = figment.merge(Env::prefixed("WT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for wt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_original_tool_defaults() {
        let config = Config::default();
        assert_eq!(config.logs_dir, PathBuf::from("logs"));
        assert!((config.inactivity_minutes - 30.0).abs() < f64::EPSILON);
        assert!(config.min_hours.abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "logs_dir = \"exports\"").unwrap();
        writeln!(file, "inactivity_minutes = 45.0").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.logs_dir, PathBuf::from("exports"));
        assert!((config.inactivity_minutes - 45.0).abs() < f64::EPSILON);
        // Untouched keys keep their defaults.
        assert!(config.min_hours.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_explicit_file_falls_back_to_defaults() {
        let config = Config::load_from(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.logs_dir, PathBuf::from("logs"));
    }
}
