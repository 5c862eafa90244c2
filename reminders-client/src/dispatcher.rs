use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reminders_shared::domain::{DISMISS_AFTER, NOTIFICATION_TAG, NOTIFICATION_TITLE};
use reminders_shared::relay::{NotificationClick, RelayMessage};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::capability::{
    NotificationCapability, NotificationEvent, NotificationSpec, Permission, UserInterface,
};
use crate::relay::{RelayError, RelayHandle};

pub const ICON_PATH: &str = "/icon-192.png";
pub const BADGE_PATH: &str = "/icon-192.png";

/// A notification created by this process, with its dismiss deadline.
#[derive(Debug, Clone)]
pub struct NotificationInstance {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub created_at: Instant,
    pub dismiss_at: Instant,
}

impl NotificationInstance {
    pub fn new(title: &str, body: &str, tag: &str, dismiss_after: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
            created_at,
            dismiss_at: created_at + dismiss_after,
        }
    }

    pub fn spec(&self) -> NotificationSpec {
        let mut spec = NotificationSpec::new(&self.title, &self.body, &self.tag);
        spec.icon = Some(ICON_PATH.to_string());
        spec
    }

    pub fn to_message(&self) -> RelayMessage {
        RelayMessage::ShowNotification {
            title: self.title.clone(),
            body: self.body.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// How a `show` call was (or was not) delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Relayed,
    Direct,
    /// No notification capability; the fallback acknowledgment was shown.
    Unsupported,
    NotPermitted,
    /// Display failed; the fallback acknowledgment was shown.
    Fallback,
}

/// Foreground notification path: permission checks, display, auto-dismiss
/// and click handling.
pub struct NotificationDispatcher {
    capability: Arc<dyn NotificationCapability>,
    ui: Arc<dyn UserInterface>,
    relay: Option<RelayHandle>,
    dismiss_after: Duration,
    auto_close: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl NotificationDispatcher {
    pub fn new(
        capability: Arc<dyn NotificationCapability>,
        ui: Arc<dyn UserInterface>,
        relay: Option<RelayHandle>,
    ) -> Self {
        Self {
            capability,
            ui,
            relay,
            dismiss_after: DISMISS_AFTER,
            auto_close: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capability.is_supported()
    }

    pub fn permission(&self) -> Permission {
        self.capability.permission()
    }

    pub async fn request_permission(&self) -> Permission {
        debug!("requesting notification permission");
        let permission = self.capability.request_permission().await;
        info!(?permission, "notification permission resolved");
        permission
    }

    pub async fn show(&self, text: &str) -> Delivery {
        if !self.capability.is_supported() {
            warn!("notifications unsupported; showing fallback acknowledgment");
            self.ui.acknowledge(text);
            return Delivery::Unsupported;
        }
        if self.capability.permission() != Permission::Granted {
            warn!("notification permission not granted; skipping reminder");
            return Delivery::NotPermitted;
        }

        let instance =
            NotificationInstance::new(NOTIFICATION_TITLE, text, NOTIFICATION_TAG, self.dismiss_after);

        // an inactive relay does not control notifications yet
        if let Some(relay) = self.relay.as_ref().filter(|r| r.is_active()) {
            match relay.post(instance.to_message()).await {
                Ok(()) => {
                    debug!(tag = %instance.tag, "notification delegated to background relay");
                    self.schedule_close(&instance).await;
                    return Delivery::Relayed;
                }
                Err(RelayError::Display(e)) => {
                    error!(error = %e, "relayed notification failed; showing fallback acknowledgment");
                    self.ui.acknowledge(text);
                    return Delivery::Fallback;
                }
                Err(e) => {
                    warn!(error = %e, "background relay unavailable; showing directly");
                }
            }
        }

        match self.capability.show(&instance.spec()).await {
            Ok(()) => {
                debug!(tag = %instance.tag, "notification shown");
                self.schedule_close(&instance).await;
                Delivery::Direct
            }
            Err(e) => {
                error!(error = %e, "notification failed; showing fallback acknowledgment");
                self.ui.acknowledge(text);
                Delivery::Fallback
            }
        }
    }

    /// Arms the auto-close for `instance`. A newer notification with the same
    /// tag replaces the older one, so its pending close is dropped.
    async fn schedule_close(&self, instance: &NotificationInstance) {
        let capability = self.capability.clone();
        let tag = instance.tag.clone();
        let deadline = instance.dismiss_at;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!(tag = %tag, "auto-dismissing notification");
            capability.close(&tag).await;
        });
        let mut pending = self.auto_close.lock().await;
        if let Some(prev) = pending.insert(instance.tag.clone(), handle) {
            prev.abort();
        }
    }

    async fn cancel_close(&self, tag: &str) {
        if let Some(handle) = self.auto_close.lock().await.remove(tag) {
            handle.abort();
        }
    }

    pub async fn handle_click(&self, click: &NotificationClick) {
        self.cancel_close(&click.tag).await;
        if click.is_dismiss() {
            debug!(tag = %click.tag, "notification dismissed");
        } else {
            debug!(tag = %click.tag, "notification clicked; focusing app");
            self.capability.focus_app().await;
        }
        self.capability.close(&click.tag).await;
    }

    pub async fn handle_event(&self, event: NotificationEvent) {
        match event {
            NotificationEvent::Clicked(click) => self.handle_click(&click).await,
            NotificationEvent::Closed { tag } => {
                debug!(tag = %tag, "notification closed");
                self.cancel_close(&tag).await;
            }
        }
    }

    /// Closes every notification that still has a pending auto-close.
    pub async fn close_all(&self) {
        let pending: Vec<(String, JoinHandle<()>)> =
            self.auto_close.lock().await.drain().collect();
        for (tag, handle) in pending {
            handle.abort();
            self.capability.close(&tag).await;
        }
    }
}
