pub mod models;
pub mod schema;

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    NewReminder, NewStatusCheck, Reminder, ReminderChangeset, ReminderPatch, StatusCheck,
};
use tracing::trace;
use uuid::Uuid;

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    pub async fn create_reminder(
        &self,
        text_: &str,
        interval: i32,
    ) -> Result<Reminder, StorageError> {
        use schema::reminders::dsl::*;
        let pool = self.pool.clone();
        let text_owned = text_.to_string();
        let new_id = Uuid::new_v4().to_string();
        trace!(id = %new_id, interval_minutes = interval, "create_reminder starting");
        tokio::task::spawn_blocking(move || -> Result<Reminder, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let now = Utc::now().naive_utc();
            let row = NewReminder {
                id: &new_id,
                text: &text_owned,
                interval_minutes: interval,
                is_active: false,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(reminders)
                .values(&row)
                .execute(&mut conn)?;
            Ok(reminders.filter(id.eq(&new_id)).first::<Reminder>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_reminders(&self) -> Result<Vec<Reminder>, StorageError> {
        use schema::reminders::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Reminder>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(reminders
                .order((created_at.asc(), id.asc()))
                .limit(LIST_LIMIT)
                .load::<Reminder>(&mut conn)?)
        })
        .await?
    }

    pub async fn get_reminder(&self, id_: &str) -> Result<Option<Reminder>, StorageError> {
        use schema::reminders::dsl::*;
        let pool = self.pool.clone();
        let rid = id_.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Reminder>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(reminders
                .filter(id.eq(&rid))
                .first::<Reminder>(&mut conn)
                .optional()?)
        })
        .await?
    }

    /// Applies `patch` and bumps `updated_at`. Returns `None` when no row has `id_`.
    pub async fn update_reminder(
        &self,
        id_: &str,
        patch: ReminderPatch,
    ) -> Result<Option<Reminder>, StorageError> {
        use schema::reminders::dsl::*;
        let pool = self.pool.clone();
        let rid = id_.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Reminder>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<Option<Reminder>, StorageError> {
                let changes = ReminderChangeset {
                    text: patch.text.as_deref(),
                    interval_minutes: patch.interval_minutes,
                    is_active: patch.is_active,
                    updated_at: Utc::now().naive_utc(),
                };
                let updated = diesel::update(reminders.filter(id.eq(&rid)))
                    .set(&changes)
                    .execute(conn)?;
                if updated == 0 {
                    return Ok(None);
                }
                Ok(Some(reminders.filter(id.eq(&rid)).first::<Reminder>(conn)?))
            })
        })
        .await?
    }

    pub async fn delete_reminder(&self, id_: &str) -> Result<bool, StorageError> {
        use schema::reminders::dsl::*;
        let pool = self.pool.clone();
        let rid = id_.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let deleted = diesel::delete(reminders.filter(id.eq(&rid))).execute(&mut conn)?;
            Ok(deleted > 0)
        })
        .await?
    }

    // Legacy status checks kept for older clients
    pub async fn create_status_check(&self, client: &str) -> Result<StatusCheck, StorageError> {
        use schema::status_checks::dsl::*;
        let pool = self.pool.clone();
        let client_owned = client.to_string();
        let new_id = Uuid::new_v4().to_string();
        tokio::task::spawn_blocking(move || -> Result<StatusCheck, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let row = NewStatusCheck {
                id: &new_id,
                client_name: &client_owned,
                timestamp: Utc::now().naive_utc(),
            };
            diesel::insert_into(status_checks)
                .values(&row)
                .execute(&mut conn)?;
            Ok(status_checks
                .filter(id.eq(&new_id))
                .first::<StatusCheck>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_status_checks(&self) -> Result<Vec<StatusCheck>, StorageError> {
        use schema::status_checks::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<StatusCheck>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(status_checks
                .order(timestamp.asc())
                .limit(LIST_LIMIT)
                .load::<StatusCheck>(&mut conn)?)
        })
        .await?
    }
}

/// Maximum rows returned by a list query.
pub const LIST_LIMIT: i64 = 1000;

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // WAL + busy timeout; PRAGMA result rows are ignored
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    Ok(())
}
