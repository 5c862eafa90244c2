use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reminders_shared::domain::IntervalUnit;

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $SMART_REMINDERS_CONFIG
  3) default: ~/.config/smart-reminders/client.yaml (optional)
"#;

#[derive(Debug, Parser)]
#[command(
    name = "reminders-client",
    version,
    about = "Recurring reminder notifications for Smart Reminders",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Optional subcommand. Without one, runs the reminder from config.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a notification every interval until interrupted
    Run {
        /// Reminder text. Falls back to config.
        #[arg(long)]
        text: Option<String>,
        /// Interval length, at least 1. Falls back to config.
        #[arg(long)]
        interval: Option<u64>,
        /// Interval unit: seconds or minutes
        #[arg(long)]
        unit: Option<IntervalUnit>,
        /// Show notifications directly instead of through the background relay
        #[arg(long)]
        no_relay: bool,
    },
    /// Install a desktop launcher, or print install instructions
    Install,
    /// Manage reminders saved on the server
    Store {
        /// Server URL (e.g., http://127.0.0.1:8001). Falls back to config.
        #[arg(long)]
        server: Option<String>,
        #[command(subcommand)]
        action: StoreCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Check the server is up
    Health,
    /// List saved reminders
    List,
    /// Save a new reminder
    Create {
        text: String,
        #[arg(long, default_value_t = 5)]
        interval_minutes: i32,
    },
    /// Show one reminder
    Get { id: String },
    /// Change fields of a reminder; omitted fields stay as they are
    Update {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        interval_minutes: Option<i32>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a reminder
    Delete { id: String },
}
