//! Web app manifest consumed by the platform to decide installability.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Standalone,
    Fullscreen,
    #[serde(rename = "minimal-ui")]
    MinimalUi,
    Browser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: DisplayMode,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

impl Default for WebManifest {
    fn default() -> Self {
        let icon = |size: u32| ManifestIcon {
            src: format!("/icon-{size}.png"),
            sizes: format!("{size}x{size}"),
            mime: "image/png".into(),
            purpose: Some("any maskable".into()),
        };
        Self {
            name: "Smart Reminders".into(),
            short_name: "Reminders".into(),
            description: "Recurring reminder notifications".into(),
            start_url: "/".into(),
            display: DisplayMode::Standalone,
            background_color: "#ffffff".into(),
            theme_color: "#3b82f6".into(),
            icons: vec![icon(192), icon(512)],
        }
    }
}
