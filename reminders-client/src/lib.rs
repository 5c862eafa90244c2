use tracing::info;

pub mod app;
pub mod capability;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod install_prompt;
pub mod platform;
pub mod relay;
pub mod session;
pub mod store;
#[cfg(test)]
mod testing;

pub use cli::{Cli, Command, StoreCommand};
pub use config::{ClientConfig, load_config, resolve_config_path};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("notification error: {0}")]
    Notification(String),
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing();

    let (cfg_path, cfg) = ClientConfig::find_and_load(cli.config)?;
    info!(path=?cfg_path, "loaded config");

    match cli.command {
        Some(Command::Store { server, action }) => {
            let server = server
                .map(|s| config::normalize_server_url(&s))
                .unwrap_or_else(|| cfg.server());
            store::run(&server, action).await
        }
        Some(Command::Install) => app::install(&cfg).await.map(|_| ()),
        Some(Command::Run {
            text,
            interval,
            unit,
            no_relay,
        }) => {
            let mut reminder = cfg.reminder();
            if let Some(t) = text {
                reminder.text = t;
            }
            if let Some(i) = interval {
                reminder.interval = i;
            }
            if let Some(u) = unit {
                reminder.unit = u;
            }
            app::run_reminder(&cfg, reminder, cfg.relay && !no_relay).await
        }
        None => app::run_reminder(&cfg, cfg.reminder(), cfg.relay).await,
    }
}
