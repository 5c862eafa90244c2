use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use reminders_shared::domain::{IntervalUnit, ReminderConfig};
use serde::{Deserialize, Serialize};

use crate::AppError;

pub const ENV_CONFIG: &str = "SMART_REMINDERS_CONFIG";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Origin the app is served from; click handling opens or focuses it.
    /// Defaults to `server_url`.
    #[serde(default)]
    pub app_origin: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub unit: IntervalUnit,
    /// Route notifications through the background relay.
    #[serde(default = "default_true")]
    pub relay: bool,
    /// Set to false to behave as if notification permission was denied.
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Already running as an installed app.
    #[serde(default)]
    pub standalone: bool,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            app_origin: None,
            text: String::new(),
            interval: default_interval(),
            unit: IntervalUnit::default(),
            relay: true,
            notifications: true,
            standalone: false,
        }
    }
}

impl ClientConfig {
    /// Resolves the config path and loads it. A missing file at the default
    /// location yields defaults; a missing explicit path is an error.
    pub fn find_and_load(cli_value: Option<PathBuf>) -> Result<(PathBuf, Self), AppError> {
        let explicit = cli_value.is_some() || std::env::var_os(ENV_CONFIG).is_some();
        let path = resolve_config_path(cli_value)?;
        if !explicit && !path.exists() {
            return Ok((path, Self::default()));
        }
        let cfg = load_config(&path)?;
        Ok((path, cfg))
    }

    pub fn origin(&self) -> String {
        normalize_server_url(self.app_origin.as_deref().unwrap_or(&self.server_url))
    }

    pub fn server(&self) -> String {
        normalize_server_url(&self.server_url)
    }

    pub fn reminder(&self) -> ReminderConfig {
        ReminderConfig::new(self.text.clone(), self.interval, self.unit)
    }
}

pub fn resolve_config_path(cli_value: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(p) = cli_value {
        return Ok(p);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(p));
    }
    default_config_path().ok_or_else(|| AppError::Config("could not determine config dir".into()))
}

pub fn default_config_path() -> Option<PathBuf> {
    let pd = ProjectDirs::from("dev", "smart-reminders", "smart-reminders")?;
    Some(pd.config_dir().join("client.yaml"))
}

pub fn load_config(path: &Path) -> Result<ClientConfig, AppError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("read {} failed: {e}", path.display())))?;
    let cfg: ClientConfig = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("parse {} failed: {e}", path.display())))?;
    Ok(cfg)
}

pub fn normalize_server_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", trimmed.trim_end_matches('/'))
    }
}
