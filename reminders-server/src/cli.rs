use clap::Parser;
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml, optional)
  DB_PATH     (default: data/reminders.db or config.db_path)
  PORT        (default: 8001 or config.listen_port)

Command-line flags take precedence over environment variables.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "reminders-server",
    version,
    about = "Smart Reminders store server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// SQLite database path
    #[arg(long)]
    pub db_path: Option<PathBuf>,
    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}
