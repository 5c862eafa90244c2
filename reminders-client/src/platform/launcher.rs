//! Desktop launcher install: the desktop counterpart of the browser's
//! deferred install prompt.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use directories::BaseDirs;
use tinytemplate::TinyTemplate;
use tracing::{debug, info, warn};

use crate::AppError;
use crate::install_prompt::{DeferredInstallPrompt, InstallChoice};

const DESKTOP_ENTRY_NAME: &str = "smart-reminders.desktop";
const DESKTOP_ENTRY_TEMPLATE: &str = include_str!("../../desktop/smart-reminders.desktop");

pub fn desktop_entry_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join("applications").join(DESKTOP_ENTRY_NAME))
}

pub fn is_installed() -> bool {
    desktop_entry_path().is_some_and(|p| p.exists())
}

#[derive(serde::Serialize)]
struct EntryCtx<'a> {
    binary_path: &'a str,
}

fn render_desktop_entry(binary_path: &str) -> Result<String, AppError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("entry", DESKTOP_ENTRY_TEMPLATE)
        .map_err(|e| AppError::Config(format!("template error: {e}")))?;
    tt.render("entry", &EntryCtx { binary_path })
        .map_err(|e| AppError::Config(format!("render error: {e}")))
}

pub fn install_desktop_entry(path: &PathBuf) -> Result<(), AppError> {
    let exe = std::env::current_exe().map_err(AppError::Io)?;
    let text = render_desktop_entry(&exe.display().to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(AppError::Io)?;
    }
    std::fs::write(path, text).map_err(AppError::Io)?;
    info!(path = %path.display(), "desktop launcher installed");
    Ok(())
}

/// Asks on the terminal whether to install the launcher, and installs it
/// when the answer is yes.
pub struct LauncherPrompt {
    path: PathBuf,
    suppressed: bool,
}

impl LauncherPrompt {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            suppressed: false,
        }
    }
}

#[async_trait]
impl DeferredInstallPrompt for LauncherPrompt {
    fn prevent_default(&mut self) {
        self.suppressed = true;
    }

    async fn prompt(&mut self) -> InstallChoice {
        debug!(suppressed = self.suppressed, "replaying launcher prompt");
        let answer = tokio::task::spawn_blocking(|| {
            print!("Install the Smart Reminders launcher? [y/N] ");
            let _ = std::io::stdout().flush();
            let mut s = String::new();
            let _ = std::io::stdin().read_line(&mut s);
            s.trim().to_ascii_lowercase()
        })
        .await
        .unwrap_or_default();
        if !matches!(answer.as_str(), "y" | "yes") {
            return InstallChoice::Dismissed;
        }
        match install_desktop_entry(&self.path) {
            Ok(()) => InstallChoice::Accepted,
            Err(e) => {
                warn!(error = %e, "launcher install failed");
                InstallChoice::Dismissed
            }
        }
    }
}
