use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReelcastError};
use crate::models::Service;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub detection: DetectionConfig,
    pub metadata: MetadataConfig,
    pub presence: PresenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub poll_interval_secs: u64,
    pub miss_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub timeout_secs: u64,
    pub ignore_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub api_key: Option<String>,
    pub negative_ttl_secs: u64,
    pub timeout_secs: u64,
    pub image_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub client_id: Option<String>,
    pub netflix_client_id: Option<String>,
    pub disney_plus_client_id: Option<String>,
    pub show_buttons: bool,
    pub timeout_secs: u64,
}

impl GeneralConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl DetectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }
}

impl PresenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The dedicated application id for a service, if one is configured.
    pub fn service_client_id(&self, service: Service) -> Option<&str> {
        let id = match service {
            Service::Netflix => self.netflix_client_id.as_deref(),
            Service::DisneyPlus => self.disney_plus_client_id.as_deref(),
        };
        id.filter(|s| !s.is_empty())
    }
}

impl AppConfig {
    /// Load config: explicit path, else the user file if it exists, else the
    /// built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let user_path = Self::config_path();
                if user_path.exists() {
                    Self::from_file(&user_path)?
                } else {
                    Self::from_toml(DEFAULT_CONFIG)?
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Override ids, secrets and the poll interval from the environment.
    ///
    /// Empty values are ignored, as is a non-numeric poll interval.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("DISCORD_CLIENT_ID") {
            self.presence.client_id = Some(v);
        }
        if let Some(v) = var("NETFLIX_CLIENT_ID") {
            self.presence.netflix_client_id = Some(v);
        }
        if let Some(v) = var("DISNEY_CLIENT_ID") {
            self.presence.disney_plus_client_id = Some(v);
        }
        if let Some(v) = var("TMDB_API_KEY") {
            self.metadata.api_key = Some(v);
        }
        if let Some(secs) = var("REELCAST_POLL_INTERVAL").and_then(|v| v.trim().parse().ok()) {
            self.general.poll_interval_secs = secs;
        }
    }

    /// Reject configs the daemon can't start with.
    ///
    /// The default presence id may be omitted only when every service has
    /// its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_default = self
            .presence
            .client_id
            .as_deref()
            .is_some_and(|s| !s.is_empty());
        let all_services_covered = Service::ALL
            .iter()
            .all(|s| self.presence.service_client_id(*s).is_some());
        if !has_default && !all_services_covered {
            return Err(ConfigError::Missing("presence.client_id (DISCORD_CLIENT_ID)"));
        }

        let has_api_key = self
            .metadata
            .api_key
            .as_deref()
            .is_some_and(|s| !s.is_empty());
        if !has_api_key {
            return Err(ConfigError::Missing("metadata.api_key (TMDB_API_KEY)"));
        }

        if self.general.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("general.poll_interval_secs must be > 0".into()));
        }
        if self.general.miss_threshold == 0 {
            return Err(ConfigError::Invalid("general.miss_threshold must be > 0".into()));
        }
        Ok(())
    }

    /// Write the built-in defaults to `path`. An existing file is only
    /// replaced when `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ReelcastError> {
        if path.exists() && !force {
            return Err(ConfigError::Invalid(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            ))
            .into());
        }
        Self::default().save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ReelcastError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Optional user source database merged over the built-in one.
    pub fn sources_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("sources.toml"))
            .unwrap_or_else(|| PathBuf::from("sources.toml"))
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "reelcast")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.presence.client_id = Some("1234".into());
        config.metadata.api_key = Some("key".into());
        config
    }

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.general.poll_interval_secs, 5);
        assert_eq!(config.general.miss_threshold, 3);
        assert_eq!(config.detection.timeout_secs, 3);
        assert!(config.detection.ignore_keywords.iter().any(|k| k == "readme"));
        assert_eq!(config.metadata.negative_ttl_secs, 600);
        assert_eq!(config.metadata.image_size, "w500");
        assert_eq!(config.presence.client_id, None);
        assert!(config.presence.show_buttons);
    }

    #[test]
    fn test_default_config_needs_credentials() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("DISCORD_CLIENT_ID", "111"),
            ("NETFLIX_CLIENT_ID", "222"),
            ("DISNEY_CLIENT_ID", ""),
            ("TMDB_API_KEY", "abc"),
            ("REELCAST_POLL_INTERVAL", "10"),
        ]));

        assert_eq!(config.presence.client_id.as_deref(), Some("111"));
        assert_eq!(config.presence.service_client_id(Service::Netflix), Some("222"));
        assert_eq!(config.presence.service_client_id(Service::DisneyPlus), None);
        assert_eq!(config.metadata.api_key.as_deref(), Some("abc"));
        assert_eq!(config.general.poll_interval_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_poll_interval_env_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("REELCAST_POLL_INTERVAL", "soon")]));
        assert_eq!(config.general.poll_interval_secs, 5);
    }

    #[test]
    fn test_per_service_ids_replace_default() {
        let mut config = valid();
        config.presence.client_id = None;
        config.presence.netflix_client_id = Some("n".into());
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.presence.disney_plus_client_id = Some("d".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = valid();
        config.general.miss_threshold = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = valid();
        config.general.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = valid();
        config.general.miss_threshold = 5;
        config.presence.show_buttons = false;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.general.miss_threshold, 5);
        assert!(!loaded.presence.show_buttons);
        assert_eq!(loaded.presence.client_id.as_deref(), Some("1234"));
    }

    #[test]
    fn test_write_default_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        AppConfig::write_default(&path, false).unwrap();
        let written = AppConfig::from_file(&path).unwrap();
        assert_eq!(written.general.poll_interval_secs, 5);
        assert_eq!(written.metadata.image_size, "w500");

        std::fs::write(&path, "# edited by hand\n").unwrap();
        let err = AppConfig::write_default(&path, false).unwrap_err();
        assert!(matches!(err, ReelcastError::Config(ConfigError::Invalid(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited by hand\n");

        AppConfig::write_default(&path, true).unwrap();
        assert!(AppConfig::from_file(&path).is_ok());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml("[general]\npoll_interval_secs = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
