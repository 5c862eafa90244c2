use clap::Parser;
use reminders_client::{Cli, run};

#[tokio::main]
async fn main() -> Result<(), reminders_client::AppError> {
    run(Cli::parse()).await
}
