//! Background relay: owns relayed notifications, their deadlines, click
//! routing and the offline resource cache. Runs as its own task and is only
//! reachable through [`RelayHandle`].

pub mod cache;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reminders_shared::domain::{ACTION_DISMISS, ACTION_OPEN, DISMISS_AFTER};
use reminders_shared::relay::{NotificationClick, RelayMessage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::capability::{
    AppWindows, NotificationAction, NotificationCapability, NotificationSpec, PlatformError,
};
use crate::dispatcher::{BADGE_PATH, ICON_PATH};
use cache::{APP_SHELL, FetchError, FetchRequest, FetchResponse, Fetcher, ResourceCache};

pub const CACHE_VERSION: &str = "v1";

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("background relay is not running")]
    Closed,
    #[error(transparent)]
    Display(#[from] PlatformError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

enum Command {
    Message {
        msg: RelayMessage,
        reply: oneshot::Sender<Result<(), PlatformError>>,
    },
    Click(NotificationClick),
    Fetch {
        request: FetchRequest,
        reply: oneshot::Sender<Result<FetchResponse, FetchError>>,
    },
}

/// Sending side of the relay channel. Cheap to clone; the relay stops once
/// every handle is dropped.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<Command>,
    active: watch::Receiver<bool>,
}

impl RelayHandle {
    /// True once the app shell is installed and the relay controls windows.
    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Posts a message and waits until the relay has acted on it. A display
    /// failure comes back as [`RelayError::Display`].
    pub async fn post(&self, msg: RelayMessage) -> Result<(), RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Message { msg, reply })
            .await
            .map_err(|_| RelayError::Closed)?;
        rx.await.map_err(|_| RelayError::Closed)??;
        Ok(())
    }

    pub async fn click(&self, click: NotificationClick) -> Result<(), RelayError> {
        self.tx
            .send(Command::Click(click))
            .await
            .map_err(|_| RelayError::Closed)
    }

    /// Fetches through the relay's network-first cache.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Fetch { request, reply })
            .await
            .map_err(|_| RelayError::Closed)?;
        let resp = rx.await.map_err(|_| RelayError::Closed)?;
        Ok(resp?)
    }
}

pub struct BackgroundRelay {
    notifications: Arc<dyn NotificationCapability>,
    windows: Arc<dyn AppWindows>,
    fetcher: Arc<dyn Fetcher>,
    cache: ResourceCache,
    origin: String,
    dismiss_after: Duration,
    deadlines: HashMap<String, Instant>,
    active: watch::Sender<bool>,
}

impl BackgroundRelay {
    pub fn new(
        notifications: Arc<dyn NotificationCapability>,
        windows: Arc<dyn AppWindows>,
        fetcher: Arc<dyn Fetcher>,
        origin: &str,
    ) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            notifications,
            windows,
            fetcher,
            cache: ResourceCache::new(CACHE_VERSION),
            origin: origin.trim_end_matches('/').to_string(),
            dismiss_after: DISMISS_AFTER,
            deadlines: HashMap::new(),
            active,
        }
    }

    /// Replaces the cache, e.g. with one left over from an older version.
    pub fn with_cache(mut self, cache: ResourceCache) -> Self {
        self.cache = cache;
        self
    }

    /// Pre-caches the app shell into a fresh cache for the current version.
    async fn install(fetcher: Arc<dyn Fetcher>) -> ResourceCache {
        let mut installed = ResourceCache::new(CACHE_VERSION);
        let stored = installed.precache(fetcher.as_ref(), APP_SHELL).await;
        info!(cache = %installed.current_name(), stored, "relay installed");
        installed
    }

    /// Adopts the installed cache, drops stale cache versions and takes
    /// control of open windows.
    async fn activate(&mut self, installed: ResourceCache) {
        self.cache.adopt(installed);
        let removed = self.cache.purge_stale();
        self.windows.claim().await;
        self.active.send_replace(true);
        info!(removed = removed.len(), "relay activated");
    }

    /// Starts the relay loop on its own task. Installation runs alongside
    /// it, so messages are answered before the app shell is cached; the
    /// handle reports active once activation completes.
    pub fn spawn(self) -> (RelayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let active = self.active.subscribe();
        let install = tokio::spawn(Self::install(self.fetcher.clone()));
        let task = tokio::spawn(self.run(rx, install));
        (RelayHandle { tx, active }, task)
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Command>,
        install: JoinHandle<ResourceCache>,
    ) {
        let mut install = Some(install);
        loop {
            let next = self.next_deadline();
            let wake = next.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                _ = tokio::time::sleep_until(wake), if next.is_some() => {
                    self.sweep(Instant::now()).await;
                }
                result = installed(&mut install) => {
                    install = None;
                    let cache = result.unwrap_or_else(|e| {
                        warn!(error = %e, "relay install task failed; activating without cache");
                        ResourceCache::new(CACHE_VERSION)
                    });
                    self.activate(cache).await;
                }
            }
        }
        if let Some(task) = install {
            task.abort();
        }
        debug!("relay channel closed; stopping");
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Message { msg, reply } => {
                let _ = reply.send(self.on_message(msg).await);
            }
            Command::Click(click) => self.on_click(&click).await,
            Command::Fetch { request, reply } => {
                let resp = self
                    .cache
                    .network_first(self.fetcher.as_ref(), &request)
                    .await;
                let _ = reply.send(resp);
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    async fn on_message(&mut self, msg: RelayMessage) -> Result<(), PlatformError> {
        match msg {
            RelayMessage::ShowNotification { title, body, tag } => {
                let mut spec = NotificationSpec::new(&title, &body, &tag);
                spec.icon = Some(ICON_PATH.to_string());
                spec.badge = Some(BADGE_PATH.to_string());
                spec.require_interaction = false;
                spec.actions = vec![
                    NotificationAction {
                        action: ACTION_OPEN.into(),
                        title: "Open App".into(),
                    },
                    NotificationAction {
                        action: ACTION_DISMISS.into(),
                        title: "Dismiss".into(),
                    },
                ];
                if let Err(e) = self.notifications.show(&spec).await {
                    error!(tag = %tag, error = %e, "relay: notification failed");
                    return Err(e);
                }
                let dismiss_at = Instant::now() + self.dismiss_after;
                self.deadlines.insert(tag.clone(), dismiss_at);
                debug!(tag = %tag, "relay: notification shown");
                Ok(())
            }
        }
    }

    /// Closes every tag whose deadline is at or before `now`.
    async fn sweep(&mut self, now: Instant) {
        let due: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(tag, _)| tag.clone())
            .collect();
        for tag in due {
            self.deadlines.remove(&tag);
            debug!(tag = %tag, "relay: auto-dismissing notification");
            self.notifications.close(&tag).await;
        }
    }

    async fn on_click(&mut self, click: &NotificationClick) {
        self.deadlines.remove(&click.tag);
        self.notifications.close(&click.tag).await;
        if click.is_dismiss() {
            debug!(tag = %click.tag, "relay: notification dismissed");
            return;
        }

        let windows = self.windows.list().await;
        if let Some(win) = windows.iter().find(|w| self.is_app_url(&w.url)) {
            match self.windows.focus(&win.id).await {
                Ok(()) => return,
                Err(e) => warn!(window = %win.id, error = %e, "relay: focus failed"),
            }
        }
        if let Err(e) = self.windows.open(&self.origin).await {
            error!(origin = %self.origin, error = %e, "relay: could not open app window");
        }
    }

    fn is_app_url(&self, url: &str) -> bool {
        url.trim_end_matches('/') == self.origin
            || url.starts_with(&format!("{}/", self.origin))
    }
}

async fn installed(
    install: &mut Option<JoinHandle<ResourceCache>>,
) -> Result<ResourceCache, JoinError> {
    match install {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}
