//! Reminder timer: validates the configuration, secures notification
//! permission, then fires the dispatcher every interval until stopped.

use std::sync::Arc;
use std::time::Duration;

use reminders_shared::domain::{ConfigInvalid, ReminderConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::capability::{Permission, UserInterface};
use crate::dispatcher::NotificationDispatcher;

const REFRESH_EVERY: Duration = Duration::from_secs(1);

/// Countdown snapshot published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub active: bool,
    pub next_fire_time: Option<Instant>,
    /// Time left until `next_fire_time`, refreshed every second.
    pub remaining: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ConfigInvalid),
    #[error("notification permission was not granted")]
    PermissionDenied,
    #[error("reminder is running; stop it first")]
    Active,
}

pub struct ReminderSession {
    config: ReminderConfig,
    dispatcher: Arc<NotificationDispatcher>,
    ui: Arc<dyn UserInterface>,
    state: Arc<watch::Sender<TimerState>>,
    fire_task: Option<JoinHandle<()>>,
    refresh_task: Option<JoinHandle<()>>,
}

impl ReminderSession {
    pub fn new(
        config: ReminderConfig,
        dispatcher: Arc<NotificationDispatcher>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        let (state, _) = watch::channel(TimerState::default());
        Self {
            config,
            dispatcher,
            ui,
            state: Arc::new(state),
            fire_task: None,
            refresh_task: None,
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ReminderConfig) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::Active);
        }
        self.config = config;
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    pub fn has_live_handles(&self) -> bool {
        self.fire_task.is_some() || self.refresh_task.is_some()
    }

    pub async fn start_with(&mut self, config: ReminderConfig) -> Result<(), SessionError> {
        self.set_config(config)?;
        self.start().await
    }

    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::Active);
        }
        if let Err(e) = self.config.validate() {
            self.ui.alert(&e.to_string());
            return Err(e.into());
        }

        if !self.dispatcher.is_supported() {
            warn!("notifications unsupported; reminders will use the fallback acknowledgment");
        } else if self.dispatcher.permission() != Permission::Granted {
            if self.dispatcher.request_permission().await != Permission::Granted {
                self.ui.set_permission_banner(true);
                warn!("notification permission denied; reminder not started");
                return Err(SessionError::PermissionDenied);
            }
            self.ui.set_permission_banner(false);
        }

        let period = self.config.period();
        let text = self.config.text.trim().to_string();
        let first_tick = Instant::now() + period;
        self.state.send_replace(TimerState {
            active: true,
            next_fire_time: Some(first_tick),
            remaining: Some(period),
        });
        info!(interval = self.config.interval, unit = %self.config.unit, "reminder started");

        self.dispatcher.show(&text).await;

        let dispatcher = self.dispatcher.clone();
        let state = self.state.clone();
        self.fire_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let next = Instant::now() + period;
                state.send_modify(|s| {
                    s.next_fire_time = Some(next);
                    s.remaining = Some(period);
                });
                debug!("reminder tick");
                dispatcher.show(&text).await;
            }
        }));

        let state = self.state.clone();
        self.refresh_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH_EVERY);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                state.send_if_modified(|s| {
                    let remaining = s.next_fire_time.map(|t| t.saturating_duration_since(now));
                    if s.remaining == remaining {
                        return false;
                    }
                    s.remaining = remaining;
                    true
                });
            }
        }));
        Ok(())
    }

    /// Stops the timer. Calling it while stopped does nothing.
    pub fn stop(&mut self) {
        let was_running = self.has_live_handles();
        self.cancel_tasks();
        self.state.send_if_modified(|s| {
            if *s == TimerState::default() {
                return false;
            }
            *s = TimerState::default();
            true
        });
        if was_running {
            info!("reminder stopped");
        }
    }

    /// Stops the timer and releases the session.
    pub fn dispose(mut self) {
        self.stop();
    }

    fn cancel_tasks(&mut self) {
        if let Some(task) = self.fire_task.take() {
            task.abort();
        }
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }
}

impl Drop for ReminderSession {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockNotifications, MockUi, NoteEvent, UiEvent};
    use reminders_shared::domain::{DISMISS_AFTER, IntervalUnit};

    fn session(caps: &Arc<MockNotifications>, ui: &Arc<MockUi>) -> ReminderSession {
        let dispatcher = Arc::new(NotificationDispatcher::new(caps.clone(), ui.clone(), None));
        ReminderSession::new(ReminderConfig::default(), dispatcher, ui.clone())
    }

    fn every_seconds(text: &str, secs: u64) -> ReminderConfig {
        ReminderConfig::new(text, secs, IntervalUnit::Seconds)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_every_interval() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        let start = Instant::now();
        s.start_with(every_seconds("stretch", 30)).await.unwrap();
        assert!(s.is_active());
        assert_eq!(s.state().next_fire_time, Some(start + Duration::from_secs(30)));

        tokio::time::sleep(Duration::from_secs(61)).await;
        let offsets: Vec<Duration> = caps.shown_at().into_iter().map(|t| t - start).collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_secs(30), Duration::from_secs(60)]
        );
        assert_eq!(s.state().next_fire_time, Some(start + Duration::from_secs(90)));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_the_next_fire() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("walk", 20)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(caps.shown().len(), 2);

        s.stop();
        assert!(!s.is_active());
        assert_eq!(s.state(), TimerState::default());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(caps.shown().len(), 2);
    }

    #[tokio::test]
    async fn blank_text_never_requests_permission() {
        let caps = Arc::new(MockNotifications::with_permission(Permission::Default));
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        let err = s.start_with(every_seconds("   ", 5)).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(ConfigInvalid::BlankText)));
        assert_eq!(caps.permission_requests(), 0);
        assert!(!s.is_active());
        assert!(!s.has_live_handles());
        assert!(matches!(ui.events().as_slice(), [UiEvent::Alert(_)]));

        let err = s.start_with(every_seconds("ok", 0)).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ConfigInvalid::IntervalTooSmall)
        ));
        assert_eq!(caps.permission_requests(), 0);
    }

    #[tokio::test]
    async fn denied_permission_shows_banner_and_stays_inactive() {
        let caps = Arc::new(
            MockNotifications::with_permission(Permission::Default).answering(Permission::Denied),
        );
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        let err = s.start_with(every_seconds("drink", 5)).await.unwrap_err();
        assert!(matches!(err, SessionError::PermissionDenied));
        assert_eq!(caps.permission_requests(), 1);
        assert!(!s.is_active());
        assert!(!s.has_live_handles());
        assert!(caps.shown().is_empty());
        assert_eq!(ui.events(), vec![UiEvent::Banner(true)]);
    }

    #[tokio::test]
    async fn granted_request_hides_banner_and_starts() {
        let caps = Arc::new(
            MockNotifications::with_permission(Permission::Default).answering(Permission::Granted),
        );
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("drink", 5)).await.unwrap();
        assert!(s.is_active());
        assert_eq!(ui.events(), vec![UiEvent::Banner(false)]);
        assert_eq!(caps.shown().len(), 1);
        s.stop();
    }

    #[tokio::test]
    async fn double_stop_is_a_no_op() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("x", 5)).await.unwrap();
        let mut rx = s.subscribe();
        let _ = rx.borrow_and_update();
        s.stop();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();
        s.stop();
        assert!(!rx.has_changed().unwrap());
        assert!(!s.has_live_handles());
        assert!(!s.is_active());
    }

    #[tokio::test]
    async fn config_is_locked_while_active() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("x", 5)).await.unwrap();
        assert!(matches!(
            s.set_config(every_seconds("y", 5)),
            Err(SessionError::Active)
        ));
        assert!(matches!(s.start().await, Err(SessionError::Active)));
        s.stop();
        s.set_config(every_seconds("y", 5)).unwrap();
        assert_eq!(s.config().text, "y");
    }

    #[tokio::test(start_paused = true)]
    async fn every_notification_closes_within_ten_seconds() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("blink", 30)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(75)).await;
        s.stop();

        let mut shown = Vec::new();
        let mut closed = Vec::new();
        for e in caps.events() {
            match e {
                NoteEvent::Shown { at, .. } => shown.push(at),
                NoteEvent::Closed { at, .. } => closed.push(at),
                NoteEvent::Focused => {}
            }
        }
        assert_eq!(shown.len(), 3);
        assert_eq!(closed.len(), 3);
        for (open, close) in shown.iter().zip(&closed) {
            assert!(*close - *open <= DISMISS_AFTER);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_tick_counts_down() {
        let caps = Arc::new(MockNotifications::granted());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("x", 10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let remaining = s.state().remaining.unwrap();
        assert!(remaining <= Duration::from_secs(7) && remaining > Duration::from_secs(6));
        s.dispose();
    }

    #[tokio::test]
    async fn unsupported_platform_still_runs_with_fallback() {
        let caps = Arc::new(MockNotifications::unsupported());
        let ui = Arc::new(MockUi::default());
        let mut s = session(&caps, &ui);

        s.start_with(every_seconds("hydrate", 5)).await.unwrap();
        assert!(s.is_active());
        assert_eq!(caps.permission_requests(), 0);
        assert_eq!(ui.events(), vec![UiEvent::Ack("hydrate".into())]);
        s.stop();
    }
}
