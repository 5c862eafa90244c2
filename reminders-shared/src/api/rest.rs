//! Minimal REST client helpers for the reminder store.

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

impl RestError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::Status { status: 404, .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RestError::Status { status: 422, .. })
    }
}

static HTTP_CLIENT: Lazy<Result<reqwest::Client, String>> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| e.to_string())
});

fn mk_client() -> Result<reqwest::Client, RestError> {
    HTTP_CLIENT.clone().map_err(RestError::Http)
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

pub async fn health(base: &str) -> Result<HealthDto, RestError> {
    let client = mk_client()?;
    let res = client
        .get(ep::health(base))
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn create_reminder(
    base: &str,
    req: &CreateReminderReq,
) -> Result<ReminderDto, RestError> {
    let client = mk_client()?;
    let res = client
        .post(ep::reminders(base))
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_reminders(base: &str) -> Result<Vec<ReminderDto>, RestError> {
    let client = mk_client()?;
    let res = client
        .get(ep::reminders(base))
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn get_reminder(base: &str, id: &str) -> Result<ReminderDto, RestError> {
    let client = mk_client()?;
    let res = client
        .get(ep::reminder(base, id))
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn update_reminder(
    base: &str,
    id: &str,
    req: &UpdateReminderReq,
) -> Result<ReminderDto, RestError> {
    let client = mk_client()?;
    let res = client
        .put(ep::reminder(base, id))
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn delete_reminder(base: &str, id: &str) -> Result<MessageResp, RestError> {
    let client = mk_client()?;
    let res = client
        .delete(ep::reminder(base, id))
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}
