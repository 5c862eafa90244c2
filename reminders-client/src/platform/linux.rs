//! Freedesktop notifications via notify-rust.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use reminders_shared::relay::NotificationClick;

use crate::capability::{
    AppWindows, NotificationCapability, NotificationEvent, NotificationSpec, Permission,
    PlatformError,
};

const APP_NAME: &str = "Smart Reminders";
const ICON_NAME: &str = "appointment-soon";
const FIRST_REPLACE_ID: u32 = 1001;

/// Server-side id and show generation of the notification holding a tag.
#[derive(Debug, Clone, Copy)]
struct Slot {
    replace_id: u32,
    generation: u64,
}

#[derive(Default)]
struct Slots {
    by_tag: HashMap<String, Slot>,
    next_id: u32,
    generation: u64,
}

impl Slots {
    /// Reuses the tag's replace id so the new notification replaces the old.
    fn claim(&mut self, tag: &str) -> Slot {
        self.generation += 1;
        let generation = self.generation;
        let next_id = &mut self.next_id;
        let slot = self.by_tag.entry(tag.to_string()).or_insert_with(|| {
            let id = FIRST_REPLACE_ID + *next_id;
            *next_id += 1;
            Slot {
                replace_id: id,
                generation,
            }
        });
        slot.generation = generation;
        *slot
    }

    fn is_current(&self, tag: &str, generation: u64) -> bool {
        self.by_tag
            .get(tag)
            .is_some_and(|s| s.generation == generation)
    }
}

pub struct DesktopNotifications {
    origin: String,
    enabled: bool,
    windows: Arc<dyn AppWindows>,
    slots: Arc<Mutex<Slots>>,
    open: Mutex<Vec<String>>,
    event_tx: mpsc::UnboundedSender<NotificationEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<NotificationEvent>>>,
}

impl DesktopNotifications {
    pub fn new(origin: &str, enabled: bool, windows: Arc<dyn AppWindows>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        debug!(enabled, "desktop notifications created");
        Self {
            origin: origin.to_string(),
            enabled,
            windows,
            slots: Arc::new(Mutex::new(Slots::default())),
            open: Mutex::new(Vec::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    fn lock_slots(&self) -> Result<std::sync::MutexGuard<'_, Slots>, PlatformError> {
        self.slots
            .lock()
            .map_err(|_| PlatformError::Notification("notification state poisoned".into()))
    }

    fn mark_open(&self, tag: &str, open: bool) -> bool {
        let Ok(mut tags) = self.open.lock() else {
            return false;
        };
        let was_open = tags.iter().any(|t| t == tag);
        tags.retain(|t| t != tag);
        if open {
            tags.push(tag.to_string());
        }
        was_open
    }
}

#[async_trait]
impl NotificationCapability for DesktopNotifications {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn request_permission(&self) -> Permission {
        self.permission()
    }

    async fn show(&self, spec: &NotificationSpec) -> Result<(), PlatformError> {
        let slot = self.lock_slots()?.claim(&spec.tag);
        debug!(tag = %spec.tag, replace_id = slot.replace_id, "show: building notification");

        let mut n = notify_rust::Notification::new();
        n.appname(APP_NAME)
            .summary(&spec.title)
            .body(&spec.body)
            .icon(ICON_NAME)
            .id(slot.replace_id)
            .urgency(if spec.require_interaction {
                notify_rust::Urgency::Critical
            } else {
                notify_rust::Urgency::Normal
            });
        for action in &spec.actions {
            n.action(&action.action, &action.title);
        }
        let handle = n
            .show_async()
            .await
            .map_err(|e| PlatformError::Notification(e.to_string()))?;
        self.mark_open(&spec.tag, true);

        // notify-rust only reports clicks through a blocking wait
        let tx = self.event_tx.clone();
        let slots = self.slots.clone();
        let tag = spec.tag.clone();
        tokio::task::spawn_blocking(move || {
            handle.wait_for_action(|action| {
                let current = slots
                    .lock()
                    .map(|s| s.is_current(&tag, slot.generation))
                    .unwrap_or(false);
                if !current {
                    return;
                }
                let event = match action {
                    "__closed" => NotificationEvent::Closed { tag: tag.clone() },
                    "default" => NotificationEvent::Clicked(NotificationClick {
                        tag: tag.clone(),
                        action: None,
                    }),
                    other => NotificationEvent::Clicked(NotificationClick {
                        tag: tag.clone(),
                        action: Some(other.to_string()),
                    }),
                };
                let _ = tx.send(event);
            });
        });
        Ok(())
    }

    async fn close(&self, tag: &str) {
        if !self.mark_open(tag, false) {
            return;
        }
        let Ok(slot) = self.lock_slots().map(|mut s| s.claim(tag)) else {
            return;
        };
        debug!(tag = %tag, "close: replacing with short-timeout notification");
        // Replace the visible notification with one that expires at once.
        let mut n = notify_rust::Notification::new();
        let res = n
            .appname(APP_NAME)
            .summary(APP_NAME)
            .id(slot.replace_id)
            .urgency(notify_rust::Urgency::Low)
            .timeout(notify_rust::Timeout::Milliseconds(1))
            .show_async()
            .await;
        if let Err(e) = res {
            warn!(tag = %tag, error = %e, "close: notify-rust failed");
        }
    }

    async fn focus_app(&self) {
        if let Err(e) = self.windows.open(&self.origin).await {
            warn!(error = %e, "could not open the app");
        } else {
            info!(origin = %self.origin, "app opened from notification");
        }
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NotificationEvent>> {
        self.event_rx.lock().ok().and_then(|mut rx| rx.take())
    }
}
