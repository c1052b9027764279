pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing directly at a settings file
pub const CONFIG_PATH_ENV: &str = "DMSFLOW_CONFIG_PATH";

/// Settings file names searched in the current directory, in order
pub const CANDIDATES: &[&str] = &["dmsflow.local.yaml", "dmsflow.yaml"];

/// Connection and timing settings of the `dms` CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// DMS endpoint, e.g. `https://dms.ap-southeast-1.myhuaweicloud.com`
    pub endpoint: String,

    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Name of the environment variable holding the IAM token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Consecutive not-found ticks tolerated while waiting for a status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_checks: Option<u32>,
}

fn default_token_env() -> String {
    "DMS_AUTH_TOKEN".to_string()
}

/// Per-operation deadlines in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub create: u64,
    pub update: u64,
    pub delete: u64,
    pub connector: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            create: 50,
            update: 50,
            delete: 15,
            connector: 30,
        }
    }
}

impl TimeoutSettings {
    pub fn create(&self) -> Duration {
        minutes(self.create)
    }

    pub fn update(&self) -> Duration {
        minutes(self.update)
    }

    pub fn delete(&self) -> Duration {
        minutes(self.delete)
    }

    pub fn connector(&self) -> Duration {
        minutes(self.connector)
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

impl Settings {
    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        let settings: Settings =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "project_id must not be empty".to_string(),
            ));
        }
        let t = &self.timeouts;
        if [t.create, t.update, t.delete, t.connector].contains(&0) {
            return Err(ConfigError::Invalid(
                "timeouts must be at least one minute".to_string(),
            ));
        }
        if [t.create, t.update, t.delete, t.connector]
            .iter()
            .any(|m| m.checked_mul(60).is_none())
        {
            return Err(ConfigError::Invalid(
                "timeouts are too large to express in seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Directory of the global settings file
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("dmsflow"))
}

/// Locate the settings file
///
/// Search order:
/// 1. `DMSFLOW_CONFIG_PATH`
/// 2. current directory: `dmsflow.local.yaml`, `dmsflow.yaml`
/// 3. `~/.config/dmsflow/config.yaml`
pub fn find_settings_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    for filename in CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("dmsflow").join("config.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

/// Read settings from an explicit path
pub fn load_from(path: &Path) -> Result<Settings> {
    let raw = std::fs::read_to_string(path)?;
    Settings::parse(&raw, path)
}

/// Locate and read the settings file
pub fn load() -> Result<Settings> {
    load_from(&find_settings_file()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const MINIMAL: &str = "endpoint: https://dms.example.com\nproject_id: p-1\n";

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("dmsflow"));
    }

    #[test]
    fn test_parse_defaults() {
        let settings = Settings::parse(MINIMAL, Path::new("dmsflow.yaml")).unwrap();

        assert_eq!(settings.token_env, "DMS_AUTH_TOKEN");
        assert_eq!(settings.region, None);
        assert_eq!(settings.timeouts, TimeoutSettings::default());
        assert_eq!(settings.timeouts.delete(), Duration::from_secs(900));
    }

    #[test]
    fn test_parse_partial_timeouts() {
        let raw = format!("{}timeouts:\n  delete: 5\n", MINIMAL);
        let settings = Settings::parse(&raw, Path::new("dmsflow.yaml")).unwrap();

        assert_eq!(settings.timeouts.delete, 5);
        assert_eq!(settings.timeouts.create, 50);
    }

    #[test]
    fn test_parse_rejects_zero_timeout() {
        let raw = format!("{}timeouts:\n  update: 0\n", MINIMAL);
        let result = Settings::parse(&raw, Path::new("dmsflow.yaml"));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_overflowing_timeout() {
        let raw = format!("{}timeouts:\n  create: {}\n", MINIMAL, u64::MAX);
        let result = Settings::parse(&raw, Path::new("dmsflow.yaml"));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let huge = TimeoutSettings {
            create: u64::MAX,
            ..TimeoutSettings::default()
        };
        assert_eq!(huge.create(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = Settings::parse("endpoint: [", Path::new("broken.yaml")).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_settings_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("dmsflow.yaml"), MINIMAL).unwrap();
        fs::write(temp_dir.path().join("dmsflow.local.yaml"), MINIMAL).unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_settings_file().unwrap();
        assert!(result.ends_with("dmsflow.local.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_settings_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, MINIMAL).unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        }

        let result = find_settings_file().unwrap();
        assert_eq!(result, config_path);

        let settings = load().unwrap();
        assert_eq!(settings.project_id, "p-1");

        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_find_settings_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_settings_file();
        if dirs::config_dir()
            .map(|dir| dir.join("dmsflow").join("config.yaml").exists())
            .unwrap_or(false)
        {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(ConfigError::SettingsFileNotFound)));
        }

        std::env::set_current_dir(original_dir).unwrap();
    }
}
