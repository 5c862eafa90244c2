mod config;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode, header},
    routing::get,
};
use chrono::{DateTime, NaiveDateTime, Utc};
pub use config::{AppConfig, ConfigError, DEFAULT_DB_PATH, DEFAULT_PORT};
use reminders_shared::api;
use reminders_shared::manifest::WebManifest;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use uuid::Uuid;

use crate::storage::models::{Reminder, ReminderPatch, StatusCheck};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
    pub manifest: WebManifest,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Self {
        Self {
            config,
            store,
            manifest: WebManifest::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/manifest.json", get(web_manifest))
        .route("/api", get(api_root))
        .route("/api/", get(api_root))
        .route("/api/health", get(api_health))
        .route(
            "/api/reminders",
            get(api_list_reminders).post(api_create_reminder),
        )
        .route(
            "/api/reminders/{id}",
            get(api_get_reminder)
                .put(api_update_reminder)
                .delete(api_delete_reminder),
        )
        .route("/api/status", get(api_list_status).post(api_create_status))
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    match state.config.cors_origin.as_deref() {
        Some("*") => app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        Some(origin) => {
            let hv = HeaderValue::from_str(origin)
                .unwrap_or(HeaderValue::from_static("http://localhost:3000"));
            app.layer(
                CorsLayer::new()
                    .allow_origin(hv)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE]),
            )
        }
        None => app,
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn web_manifest(State(state): State<AppState>) -> AxumResponse {
    let mut resp = Json(state.manifest.clone()).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/manifest+json"),
    );
    resp
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    // Disable caching for API and health endpoints
    if path == "/healthz" || path.starts_with("/api/") || path == "/api" {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    Ok(resp)
}

fn rfc3339(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}

impl From<Reminder> for api::ReminderDto {
    fn from(r: Reminder) -> Self {
        api::ReminderDto {
            id: r.id,
            text: r.text,
            interval_minutes: r.interval_minutes,
            is_active: r.is_active,
            created_at: rfc3339(r.created_at),
            updated_at: rfc3339(r.updated_at),
        }
    }
}

impl From<StatusCheck> for api::StatusCheckDto {
    fn from(s: StatusCheck) -> Self {
        api::StatusCheckDto {
            id: s.id,
            client_name: s.client_name,
            timestamp: rfc3339(s.timestamp),
        }
    }
}

async fn api_root(State(state): State<AppState>) -> Json<api::MessageResp> {
    Json(api::MessageResp {
        message: format!("{} is running!", state.config.service_name),
    })
}

async fn api_health(State(state): State<AppState>) -> Json<api::HealthDto> {
    Json(api::HealthDto {
        status: "healthy".into(),
        timestamp: Utc::now().to_rfc3339(),
        service: state.config.service_name.clone(),
    })
}

async fn api_create_reminder(
    State(state): State<AppState>,
    payload: Result<Json<api::CreateReminderReq>, JsonRejection>,
) -> Result<Json<api::ReminderDto>, AppError> {
    let Json(body) = payload.map_err(AppError::from_rejection)?;
    body.validate().map_err(AppError::unprocessable)?;
    let row = state
        .store
        .create_reminder(&body.text, body.interval_minutes)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(id = %row.id, interval_minutes = row.interval_minutes, "reminder created");
    Ok(Json(row.into()))
}

async fn api_list_reminders(
    State(state): State<AppState>,
) -> Result<Json<Vec<api::ReminderDto>>, AppError> {
    let rows = state
        .store
        .list_reminders()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn api_get_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<api::ReminderDto>, AppError> {
    let row = state
        .store
        .get_reminder(&id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Reminder not found"))?;
    Ok(Json(row.into()))
}

async fn api_update_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<api::UpdateReminderReq>, JsonRejection>,
) -> Result<Json<api::ReminderDto>, AppError> {
    let Json(body) = payload.map_err(AppError::from_rejection)?;
    body.validate().map_err(AppError::unprocessable)?;
    let patch = ReminderPatch {
        text: body.text,
        interval_minutes: body.interval_minutes,
        is_active: body.is_active,
    };
    let row = state
        .store
        .update_reminder(&id, patch)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Reminder not found"))?;
    tracing::info!(id = %row.id, is_active = row.is_active, "reminder updated");
    Ok(Json(row.into()))
}

async fn api_delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<api::MessageResp>, AppError> {
    let deleted = state
        .store
        .delete_reminder(&id)
        .await
        .map_err(AppError::internal)?;
    if !deleted {
        return Err(AppError::not_found("Reminder not found"));
    }
    tracing::info!(id = %id, "reminder deleted");
    Ok(Json(api::MessageResp {
        message: "Reminder deleted successfully".into(),
    }))
}

async fn api_create_status(
    State(state): State<AppState>,
    payload: Result<Json<api::StatusCheckCreateReq>, JsonRejection>,
) -> Result<Json<api::StatusCheckDto>, AppError> {
    let Json(body) = payload.map_err(AppError::from_rejection)?;
    let row = state
        .store
        .create_status_check(&body.client_name)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(row.into()))
}

async fn api_list_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<api::StatusCheckDto>>, AppError> {
    let rows = state
        .store
        .list_status_checks()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl AppError {
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn unprocessable<T: Into<String>>(msg: T) -> Self {
        Self::Unprocessable(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
    /// Syntax errors stay 400; well-formed JSON of the wrong shape is 422.
    fn from_rejection(rej: JsonRejection) -> Self {
        match rej {
            JsonRejection::JsonSyntaxError(e) => Self::BadRequest(e.body_text()),
            JsonRejection::MissingJsonContentType(e) => Self::BadRequest(e.body_text()),
            other => Self::Unprocessable(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            AppError::Unprocessable(m) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                m,
                "validation_error",
                None,
            ),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(api::ErrorBody { error: msg });
        (status, body).into_response()
    }
}
