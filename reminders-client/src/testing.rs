//! Recording mocks for the platform capabilities.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::capability::{
    AppWindows, ClientWindow, NotificationCapability, NotificationEvent, NotificationSpec,
    Permission, PlatformError, UserInterface,
};
use crate::install_prompt::{DeferredInstallPrompt, InstallChoice};
use crate::relay::cache::{FetchError, FetchRequest, FetchResponse, Fetcher, ResponseKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    Shown { tag: String, body: String, at: Instant },
    Closed { tag: String, at: Instant },
    Focused,
}

pub struct MockNotifications {
    supported: bool,
    failing: bool,
    permission: Mutex<Permission>,
    answer: Mutex<Permission>,
    requests: AtomicUsize,
    focuses: AtomicUsize,
    shown: Mutex<Vec<NotificationSpec>>,
    open: Mutex<Vec<String>>,
    events: Mutex<Vec<NoteEvent>>,
    event_tx: mpsc::UnboundedSender<NotificationEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<NotificationEvent>>>,
}

impl MockNotifications {
    /// Permission starts as `permission`; a request answers with the same value
    /// unless overridden with [`MockNotifications::answering`].
    pub fn with_permission(permission: Permission) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            supported: true,
            failing: false,
            permission: Mutex::new(permission),
            answer: Mutex::new(permission),
            requests: AtomicUsize::new(0),
            focuses: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
            open: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    pub fn granted() -> Self {
        Self::with_permission(Permission::Granted)
    }

    pub fn unsupported() -> Self {
        let mut m = Self::with_permission(Permission::Denied);
        m.supported = false;
        m
    }

    pub fn answering(self, answer: Permission) -> Self {
        *self.answer.lock().unwrap() = answer;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn permission_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn focus_count(&self) -> usize {
        self.focuses.load(Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<NotificationSpec> {
        self.shown.lock().unwrap().clone()
    }

    pub fn open_tags(&self) -> Vec<String> {
        self.open.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<NoteEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn shown_at(&self) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NoteEvent::Shown { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn emit(&self, event: NotificationEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[async_trait]
impl NotificationCapability for MockNotifications {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        *self.permission.lock().unwrap() = answer;
        answer
    }

    async fn show(&self, spec: &NotificationSpec) -> Result<(), PlatformError> {
        if self.failing {
            return Err(PlatformError::Notification("mock failure".into()));
        }
        self.shown.lock().unwrap().push(spec.clone());
        let mut open = self.open.lock().unwrap();
        open.retain(|t| t != &spec.tag);
        open.push(spec.tag.clone());
        self.events.lock().unwrap().push(NoteEvent::Shown {
            tag: spec.tag.clone(),
            body: spec.body.clone(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn close(&self, tag: &str) {
        let mut open = self.open.lock().unwrap();
        let before = open.len();
        open.retain(|t| t != tag);
        if open.len() != before {
            self.events.lock().unwrap().push(NoteEvent::Closed {
                tag: tag.to_string(),
                at: Instant::now(),
            });
        }
    }

    async fn focus_app(&self) {
        self.focuses.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(NoteEvent::Focused);
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NotificationEvent>> {
        self.event_rx.lock().unwrap().take()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Alert(String),
    Banner(bool),
    Ack(String),
    InstallVisible(bool),
    Instructions(String),
}

#[derive(Default)]
pub struct MockUi {
    events: Mutex<Vec<UiEvent>>,
}

impl MockUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, e: UiEvent) {
        self.events.lock().unwrap().push(e);
    }
}

impl UserInterface for MockUi {
    fn alert(&self, message: &str) {
        self.push(UiEvent::Alert(message.to_string()));
    }
    fn set_permission_banner(&self, visible: bool) {
        self.push(UiEvent::Banner(visible));
    }
    fn acknowledge(&self, text: &str) {
        self.push(UiEvent::Ack(text.to_string()));
    }
    fn set_install_visible(&self, visible: bool) {
        self.push(UiEvent::InstallVisible(visible));
    }
    fn show_install_instructions(&self, text: &str) {
        self.push(UiEvent::Instructions(text.to_string()));
    }
}

#[derive(Default)]
pub struct MockWindows {
    windows: Vec<ClientWindow>,
    claims: AtomicUsize,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockWindows {
    pub fn with_windows(windows: &[(&str, &str)]) -> Self {
        Self {
            windows: windows
                .iter()
                .map(|(id, url)| ClientWindow {
                    id: id.to_string(),
                    url: url.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn focused(&self) -> Vec<String> {
        self.focused.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppWindows for MockWindows {
    async fn claim(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
    }

    async fn list(&self) -> Vec<ClientWindow> {
        self.windows.clone()
    }

    async fn focus(&self, id: &str) -> Result<(), PlatformError> {
        self.focused.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn open(&self, url: &str) -> Result<(), PlatformError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Serves canned responses; unknown URLs answer 404 and `set_offline`
/// turns every request into a network error.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl MockFetcher {
    /// Every request waits `latency` before answering.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: &str, status: u16, kind: ResponseKind, body: &[u8]) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            FetchResponse {
                status,
                kind,
                content_type: None,
                body: body.to_vec(),
            },
        );
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".into()));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&req.url)
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                kind: ResponseKind::Basic,
                content_type: None,
                body: Vec::new(),
            }))
    }
}

/// Deferred install prompt that answers with a fixed choice.
pub struct MockPrompt {
    pub choice: InstallChoice,
    pub prevented: std::sync::Arc<AtomicBool>,
    pub prompts: std::sync::Arc<AtomicUsize>,
}

impl MockPrompt {
    pub fn new(choice: InstallChoice) -> Self {
        Self {
            choice,
            prevented: Default::default(),
            prompts: Default::default(),
        }
    }
}

#[async_trait]
impl DeferredInstallPrompt for MockPrompt {
    fn prevent_default(&mut self) {
        self.prevented.store(true, Ordering::SeqCst);
    }

    async fn prompt(&mut self) -> InstallChoice {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.choice
    }
}
