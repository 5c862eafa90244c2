//! Messages exchanged between the foreground session and the background relay.

use serde::{Deserialize, Serialize};

/// Foreground → relay message. Serialized as
/// `{"type":"SHOW_NOTIFICATION","title":..,"body":..,"tag":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    ShowNotification {
        title: String,
        body: String,
        tag: String,
    },
}

/// A click on a notification, optionally on one of its action buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationClick {
    pub tag: String,
    #[serde(default)]
    pub action: Option<String>,
}

impl NotificationClick {
    pub fn is_dismiss(&self) -> bool {
        self.action.as_deref() == Some(crate::domain::ACTION_DISMISS)
    }
}
