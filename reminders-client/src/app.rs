//! Foreground reminder agent: wires the platform, relay, dispatcher and
//! session together and pumps notification events until shutdown.

use std::sync::Arc;
use std::time::Duration;

use reminders_shared::domain::ReminderConfig;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::AppError;
use crate::capability::NotificationEvent;
use crate::config::ClientConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::install_prompt::{InstallOutcome, InstallPromptManager, PlatformFamily};
use crate::platform::{self, Platform};
use crate::relay::{BackgroundRelay, RelayHandle};
use crate::session::{ReminderSession, SessionError, TimerState};

pub async fn run_reminder(
    cfg: &ClientConfig,
    reminder: ReminderConfig,
    use_relay: bool,
) -> Result<(), AppError> {
    let plat = platform::detect(cfg)?;
    let cancel = CancellationToken::new();
    run_with(plat, &cfg.origin(), reminder, use_relay, cancel.clone(), async move {
        shutdown_signal().await;
        cancel.cancel();
    })
    .await
}

/// Runs until `shutdown` resolves. Split out so the loop runs against any
/// [`Platform`].
pub async fn run_with<F>(
    plat: Platform,
    origin: &str,
    reminder: ReminderConfig,
    use_relay: bool,
    cancel: CancellationToken,
    shutdown: F,
) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let relay = use_relay.then(|| {
        BackgroundRelay::new(
            plat.notifications.clone(),
            plat.windows.clone(),
            plat.fetcher.clone(),
            origin,
        )
        .spawn()
    });
    let relay_handle = relay.as_ref().map(|(h, _)| h.clone());

    let dispatcher = Arc::new(NotificationDispatcher::new(
        plat.notifications.clone(),
        plat.ui.clone(),
        relay_handle.clone(),
    ));
    let mut session = ReminderSession::new(reminder, dispatcher.clone(), plat.ui.clone());

    match session.start().await {
        Ok(()) => {}
        Err(SessionError::Validation(e)) => return Err(AppError::Config(e.to_string())),
        Err(e @ SessionError::PermissionDenied) | Err(e @ SessionError::Active) => {
            return Err(AppError::Notification(e.to_string()));
        }
    }

    let shutdown_task = tokio::spawn(shutdown);
    let events = plat.notifications.take_events();
    pump(
        cancel.clone(),
        events,
        session.subscribe(),
        dispatcher.clone(),
        relay_handle,
    )
    .await;

    info!("stopping reminder");
    session.dispose();
    dispatcher.close_all().await;
    drop(dispatcher);
    if let Some((handle, task)) = relay {
        drop(handle);
        if tokio::time::timeout(Duration::from_secs(3), task).await.is_err() {
            warn!("background relay did not stop in time");
        }
    }
    shutdown_task.abort();
    Ok(())
}

async fn pump(
    cancel: CancellationToken,
    mut events: Option<mpsc::UnboundedReceiver<NotificationEvent>>,
    mut state: watch::Receiver<TimerState>,
    dispatcher: Arc<NotificationDispatcher>,
    relay: Option<RelayHandle>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            ev = recv_event(&mut events) => match ev {
                Some(NotificationEvent::Clicked(click)) => {
                    // clicks on relayed notifications belong to the relay
                    let relayed = match &relay {
                        Some(r) if r.is_active() => r.click(click.clone()).await.is_ok(),
                        _ => false,
                    };
                    if relayed {
                        dispatcher
                            .handle_event(NotificationEvent::Closed { tag: click.tag })
                            .await;
                    } else {
                        dispatcher.handle_click(&click).await;
                    }
                }
                Some(closed) => dispatcher.handle_event(closed).await,
                None => events = None,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = state.borrow_and_update().clone();
                if let Some(left) = s.remaining {
                    debug!(active = s.active, seconds_left = left.as_secs(), "countdown");
                }
            }
        }
    }
}

async fn recv_event(
    events: &mut Option<mpsc::UnboundedReceiver<NotificationEvent>>,
) -> Option<NotificationEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

pub async fn install(cfg: &ClientConfig) -> Result<InstallOutcome, AppError> {
    let plat = platform::detect(cfg)?;
    #[cfg(all(unix, not(target_os = "macos")))]
    let installed = cfg.standalone || platform::launcher::is_installed();
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    let installed = cfg.standalone;

    let mut manager = InstallPromptManager::new(plat.ui.clone(), PlatformFamily::current(), installed);

    #[cfg(all(unix, not(target_os = "macos")))]
    if let Some(path) = platform::launcher::desktop_entry_path() {
        manager.on_install_available(Box::new(platform::launcher::LauncherPrompt::new(path)));
    }

    let outcome = manager.trigger_install().await;
    match &outcome {
        InstallOutcome::Accepted => {
            manager.on_app_installed();
            println!("Smart Reminders launcher installed.");
        }
        InstallOutcome::Dismissed => println!("Install cancelled."),
        InstallOutcome::AlreadyInstalled => println!("Smart Reminders is already installed."),
        InstallOutcome::ManualInstructions(_) => {}
    }
    Ok(outcome)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (Ok(mut sigint), Ok(mut sigterm)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) else {
            warn!("shutdown: could not install signal handlers; falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigint.recv() => {
                info!("shutdown: received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("shutdown: received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown: received Ctrl+C");
    }
}
