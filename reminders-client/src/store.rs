//! `store` subcommands: CRUD against the reminder server.

use reminders_shared::api::{self, ReminderDto, rest};
use tracing::{debug, info};

use crate::AppError;
use crate::cli::StoreCommand;

fn rest_err(e: rest::RestError) -> AppError {
    if e.is_not_found() {
        AppError::Http("reminder not found".into())
    } else if e.is_validation() {
        AppError::Http(format!("rejected by server: {e}"))
    } else {
        AppError::Http(e.to_string())
    }
}

fn print_reminder(r: &ReminderDto) {
    let state = if r.is_active { "active" } else { "inactive" };
    println!(
        "{}  every {} min  [{}]  {}",
        r.id, r.interval_minutes, state, r.text
    );
}

pub async fn run(server: &str, cmd: StoreCommand) -> Result<(), AppError> {
    debug!(server = %server, ?cmd, "store command");
    match cmd {
        StoreCommand::Health => {
            let h = rest::health(server).await.map_err(rest_err)?;
            println!("{} is {} ({})", h.service, h.status, h.timestamp);
        }
        StoreCommand::List => {
            let all = rest::list_reminders(server).await.map_err(rest_err)?;
            if all.is_empty() {
                println!("No reminders saved.");
            }
            for r in &all {
                print_reminder(r);
            }
        }
        StoreCommand::Create {
            text,
            interval_minutes,
        } => {
            let req = api::CreateReminderReq {
                text,
                interval_minutes,
            };
            req.validate().map_err(AppError::Config)?;
            let r = rest::create_reminder(server, &req).await.map_err(rest_err)?;
            info!(id = %r.id, "reminder saved");
            print_reminder(&r);
        }
        StoreCommand::Get { id } => {
            let r = rest::get_reminder(server, &id).await.map_err(rest_err)?;
            print_reminder(&r);
        }
        StoreCommand::Update {
            id,
            text,
            interval_minutes,
            active,
        } => {
            let req = api::UpdateReminderReq {
                text,
                interval_minutes,
                is_active: active,
            };
            req.validate().map_err(AppError::Config)?;
            let r = rest::update_reminder(server, &id, &req)
                .await
                .map_err(rest_err)?;
            print_reminder(&r);
        }
        StoreCommand::Delete { id } => {
            let msg = rest::delete_reminder(server, &id).await.map_err(rest_err)?;
            println!("{}", msg.message);
        }
    }
    Ok(())
}
