pub mod console;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod launcher;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod linux;

use std::sync::Arc;

use tracing::info;

use crate::AppError;
use crate::capability::{AppWindows, NotificationCapability, UserInterface};
use crate::config::ClientConfig;
use crate::relay::cache::{Fetcher, HttpFetcher};

/// Platform services selected for the current OS.
pub struct Platform {
    pub notifications: Arc<dyn NotificationCapability>,
    pub windows: Arc<dyn AppWindows>,
    pub ui: Arc<dyn UserInterface>,
    pub fetcher: Arc<dyn Fetcher>,
}

/// Detect the current platform and return its implementations.
pub fn detect(cfg: &ClientConfig) -> Result<Platform, AppError> {
    let origin = cfg.origin();
    let windows = Arc::new(console::BrowserWindows::new());
    let fetcher =
        HttpFetcher::new(&origin).map_err(|e| AppError::Config(format!("app origin: {e}")))?;

    #[cfg(all(unix, not(target_os = "macos")))]
    let notifications: Arc<dyn NotificationCapability> = {
        info!("platform selected: linux desktop notifications");
        Arc::new(linux::DesktopNotifications::new(
            &origin,
            cfg.notifications,
            windows.clone(),
        ))
    };
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    let notifications: Arc<dyn NotificationCapability> = {
        info!("platform selected: console only");
        Arc::new(console::NoNotifications)
    };

    Ok(Platform {
        notifications,
        windows,
        ui: Arc::new(console::ConsoleUi),
        fetcher: Arc::new(fetcher),
    })
}
