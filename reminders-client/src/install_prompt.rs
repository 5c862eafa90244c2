//! Install prompt handling: capture the platform's one-shot install signal,
//! replay it on demand, and fall back to manual instructions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::capability::UserInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
    Accepted,
    Dismissed,
}

/// A deferred platform install prompt. It can be replayed once.
#[async_trait]
pub trait DeferredInstallPrompt: Send {
    /// Stops the platform from showing its own prompt.
    fn prevent_default(&mut self);
    async fn prompt(&mut self) -> InstallChoice;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
    ManualInstructions(String),
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    Ios,
    Android,
    Desktop,
}

impl PlatformFamily {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "ios" => PlatformFamily::Ios,
            "android" => PlatformFamily::Android,
            _ => PlatformFamily::Desktop,
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            PlatformFamily::Ios => {
                "To install: tap the Share button, then choose \"Add to Home Screen\"."
            }
            PlatformFamily::Android => {
                "To install: open the browser menu and choose \"Install app\" or \"Add to Home screen\"."
            }
            PlatformFamily::Desktop => {
                "To install: use the install icon in the browser's address bar, or run `reminders-client install`."
            }
        }
    }
}

pub struct InstallPromptManager {
    ui: Arc<dyn UserInterface>,
    family: PlatformFamily,
    standalone: bool,
    installed: bool,
    deferred: Option<Box<dyn DeferredInstallPrompt>>,
}

impl InstallPromptManager {
    /// `standalone` is true when the app already runs as an installed app;
    /// the affordance is then never shown.
    pub fn new(ui: Arc<dyn UserInterface>, family: PlatformFamily, standalone: bool) -> Self {
        if standalone {
            debug!("running standalone; install affordance suppressed");
        }
        Self {
            ui,
            family,
            standalone,
            installed: false,
            deferred: None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.standalone || self.installed
    }

    pub fn has_deferred_prompt(&self) -> bool {
        self.deferred.is_some()
    }

    /// Captures the install signal. Returns false when the app is already
    /// installed and the signal was dropped.
    pub fn on_install_available(&mut self, mut signal: Box<dyn DeferredInstallPrompt>) -> bool {
        signal.prevent_default();
        if self.is_installed() {
            debug!("install signal ignored; already installed");
            return false;
        }
        self.deferred = Some(signal);
        self.ui.set_install_visible(true);
        info!("install prompt captured");
        true
    }

    pub async fn trigger_install(&mut self) -> InstallOutcome {
        if self.is_installed() {
            return InstallOutcome::AlreadyInstalled;
        }
        let Some(mut prompt) = self.deferred.take() else {
            let text = self.family.instructions().to_string();
            self.ui.show_install_instructions(&text);
            return InstallOutcome::ManualInstructions(text);
        };
        match prompt.prompt().await {
            InstallChoice::Accepted => {
                info!("install prompt accepted");
                self.ui.set_install_visible(false);
                InstallOutcome::Accepted
            }
            InstallChoice::Dismissed => {
                info!("install prompt dismissed");
                InstallOutcome::Dismissed
            }
        }
    }

    pub fn on_app_installed(&mut self) {
        info!("app installed");
        self.installed = true;
        self.deferred = None;
        self.ui.set_install_visible(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPrompt, MockUi, UiEvent};
    use std::sync::atomic::Ordering;

    fn manager(ui: &Arc<MockUi>, standalone: bool) -> InstallPromptManager {
        InstallPromptManager::new(ui.clone(), PlatformFamily::Desktop, standalone)
    }

    #[tokio::test]
    async fn capture_accept_then_second_trigger_shows_instructions() {
        let ui = Arc::new(MockUi::default());
        let mut m = manager(&ui, false);

        let prompt = MockPrompt::new(InstallChoice::Accepted);
        let prevented = prompt.prevented.clone();
        let prompts = prompt.prompts.clone();
        assert!(m.on_install_available(Box::new(prompt)));
        assert!(prevented.load(Ordering::SeqCst));
        assert_eq!(ui.events(), vec![UiEvent::InstallVisible(true)]);

        assert_eq!(m.trigger_install().await, InstallOutcome::Accepted);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert!(!m.has_deferred_prompt());

        let second = m.trigger_install().await;
        assert!(matches!(second, InstallOutcome::ManualInstructions(_)));
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert_eq!(
            ui.events(),
            vec![
                UiEvent::InstallVisible(true),
                UiEvent::InstallVisible(false),
                UiEvent::Instructions(PlatformFamily::Desktop.instructions().into()),
            ]
        );
    }

    #[tokio::test]
    async fn dismissal_discards_the_signal_but_keeps_affordance() {
        let ui = Arc::new(MockUi::default());
        let mut m = manager(&ui, false);
        m.on_install_available(Box::new(MockPrompt::new(InstallChoice::Dismissed)));
        assert_eq!(m.trigger_install().await, InstallOutcome::Dismissed);
        assert!(!m.has_deferred_prompt());
        assert_eq!(ui.events(), vec![UiEvent::InstallVisible(true)]);
    }

    #[tokio::test]
    async fn standalone_never_shows_affordance() {
        let ui = Arc::new(MockUi::default());
        let mut m = manager(&ui, true);
        let prompt = MockPrompt::new(InstallChoice::Accepted);
        let prevented = prompt.prevented.clone();
        assert!(!m.on_install_available(Box::new(prompt)));
        assert!(prevented.load(Ordering::SeqCst));
        assert_eq!(m.trigger_install().await, InstallOutcome::AlreadyInstalled);
        assert!(ui.events().is_empty());
    }

    #[tokio::test]
    async fn installed_event_hides_and_drops_signal() {
        let ui = Arc::new(MockUi::default());
        let mut m = manager(&ui, false);
        m.on_install_available(Box::new(MockPrompt::new(InstallChoice::Accepted)));
        m.on_app_installed();
        assert!(!m.has_deferred_prompt());
        assert_eq!(m.trigger_install().await, InstallOutcome::AlreadyInstalled);
        assert_eq!(
            ui.events(),
            vec![UiEvent::InstallVisible(true), UiEvent::InstallVisible(false)]
        );
    }

    #[test]
    fn instructions_differ_per_family() {
        assert_ne!(
            PlatformFamily::Ios.instructions(),
            PlatformFamily::Desktop.instructions()
        );
        assert!(PlatformFamily::Android.instructions().contains("Install app"));
    }
}
