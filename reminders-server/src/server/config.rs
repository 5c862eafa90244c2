use reminders_shared::api::SERVICE_NAME;
use serde::Deserialize;
use std::{env, fs, path::Path};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_DB_PATH: &str = "data/reminders.db";
pub const DEFAULT_PORT: u16 = 8001;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub listen_port: Option<u16>,
    #[serde(default)]
    pub db_path: Option<String>,
    /// Allowed CORS origin; `"*"` allows any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_port: None,
            db_path: None,
            cors_origin: Some("*".into()),
            service_name: default_service_name(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    /// Loads from `$CONFIG_PATH`, falling back to built-in defaults when the
    /// default `config.yaml` is absent. An explicitly named file must exist.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var("CONFIG_PATH") {
            Ok(path) => Self::load_from_path(path),
            Err(_) => Self::load_or_default(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if !path.as_ref().exists() {
            tracing::info!(path = %path.as_ref().display(), "config file absent; using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        let cfg: AppConfig = serde_yaml::from_str(&text)?;
        Ok(cfg)
    }

    /// `PORT` env overrides the config file; default 8001.
    pub fn resolve_port(&self) -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .or(self.listen_port)
            .unwrap_or(DEFAULT_PORT)
    }

    /// `DB_PATH` env overrides the config file.
    pub fn resolve_db_path(&self) -> String {
        env::var("DB_PATH")
            .ok()
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_yaml() {
        let cfg: AppConfig = serde_yaml::from_str("listen_port: 9000\n").unwrap();
        assert_eq!(cfg.listen_port, Some(9000));
        assert_eq!(cfg.service_name, SERVICE_NAME);
        assert!(cfg.cors_origin.is_none());
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(cfg.cors_origin.as_deref(), Some("*"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppConfig::load_from_path(dir.path().join("absent.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
