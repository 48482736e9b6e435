//! HTTP control surface
//!
//! Thin request/response glue over the core components. Failures return a
//! structured `{"status": "error", "message": ...}` envelope with a
//! non-2xx status; everything else is a `{"status": "success", ...}`
//! envelope or the bare check result.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sentinel_core::{
    ChannelCredentials, CheckStatus, Error, Monitor, Notifier, Scheduler, StatusKind,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared handles into the core components
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub scheduler: Arc<Scheduler>,
    pub notifier: Arc<Notifier>,
}

/// Build the control-surface router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status).post(force_check))
        .route("/api/history", get(get_history))
        .route("/api/logs/clear", post(clear_logs))
        .route("/api/schedule", get(get_schedule).post(update_schedule))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/discord", post(update_discord))
        .route("/api/notifications/pushover", post(update_pushover))
        .route("/api/notifications/test", post(test_notification))
        .route("/api/notifications/debug", get(get_debug).post(set_debug))
        .route("/health", get(health))
        .with_state(state)
}

fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "status": "error", "message": message.into() }))
}

fn internal_error(error: Error) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, error_body(error.to_string())).into_response()
}

async fn get_status(State(state): State<AppState>) -> Json<CheckStatus> {
    Json(state.monitor.check().await)
}

async fn force_check(State(state): State<AppState>) -> Json<Value> {
    let result = state.monitor.check().await;

    if result.status == StatusKind::Changed {
        if let Some(ip) = result.ip {
            state.notifier.notify_ip_change(ip).await;
        }
    }

    Json(json!({
        "status": "success",
        "message": "IP check completed",
        "data": result,
    }))
}

async fn get_history(State(state): State<AppState>) -> Response {
    match state.monitor.history().await {
        Ok(logs) => {
            let count = logs.len();
            Json(json!({ "status": "success", "logs": logs, "count": count })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn clear_logs(State(state): State<AppState>) -> Response {
    match state.monitor.rebaseline().await {
        Ok(_) => Json(json!({
            "status": "success",
            "message": "All logs and statistics have been cleared",
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_schedule(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": state.scheduler.schedule_info().await,
    }))
}

#[derive(Deserialize)]
struct ScheduleUpdate {
    cron: Option<String>,
    interval: Option<u64>,
}

async fn update_schedule(
    State(state): State<AppState>,
    Json(update): Json<ScheduleUpdate>,
) -> Response {
    let result = match update.cron {
        Some(cron) => state.scheduler.set_cron(&cron).await,
        None => {
            state
                .scheduler
                .set_interval(update.interval.unwrap_or(300))
                .await
        }
    };

    match result {
        Ok(()) => Json(json!({
            "status": "success",
            "message": "Schedule updated successfully",
        }))
        .into_response(),
        Err(e @ Error::Config(_)) => {
            (StatusCode::BAD_REQUEST, error_body(e.to_string())).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn get_notifications(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": state.notifier.config().await,
    }))
}

#[derive(Deserialize)]
struct DiscordUpdate {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    webhook_url: String,
    #[serde(default)]
    events: Vec<String>,
}

async fn update_discord(
    State(state): State<AppState>,
    Json(update): Json<DiscordUpdate>,
) -> Response {
    match state
        .notifier
        .configure_discord(update.enabled, update.webhook_url, update.events)
        .await
    {
        Ok(()) => Json(json!({ "status": "success" })).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct PushoverUpdate {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    user_key: String,
    #[serde(default)]
    api_token: String,
    #[serde(default)]
    events: Vec<String>,
}

async fn update_pushover(
    State(state): State<AppState>,
    Json(update): Json<PushoverUpdate>,
) -> Response {
    match state
        .notifier
        .configure_pushover(
            update.enabled,
            update.user_key,
            update.api_token,
            update.events,
        )
        .await
    {
        Ok(()) => Json(json!({ "status": "success" })).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct TestRequest {
    service: String,
    webhook_url: Option<String>,
    user_key: Option<String>,
    api_token: Option<String>,
}

async fn test_notification(
    State(state): State<AppState>,
    Json(request): Json<TestRequest>,
) -> Response {
    // Ad-hoc credentials when supplied; stored credentials otherwise
    let credentials = match request.service.as_str() {
        "discord" => request
            .webhook_url
            .filter(|url| !url.is_empty())
            .map(|webhook_url| ChannelCredentials::Discord { webhook_url }),
        "pushover" => match (request.user_key, request.api_token) {
            (Some(user_key), Some(api_token)) if !user_key.is_empty() && !api_token.is_empty() => {
                Some(ChannelCredentials::Pushover {
                    user_key,
                    api_token,
                })
            }
            _ => None,
        },
        _ => None,
    };

    if state
        .notifier
        .test_channel(&request.service, credentials)
        .await
    {
        Json(json!({
            "status": "success",
            "message": format!("Test notification sent to {}", request.service),
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            error_body(format!(
                "Failed to send test notification to {}",
                request.service
            )),
        )
            .into_response()
    }
}

async fn get_debug(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "debug": state.notifier.config().await.debug }))
}

#[derive(Deserialize)]
struct DebugUpdate {
    #[serde(default)]
    enabled: bool,
}

async fn set_debug(State(state): State<AppState>, Json(update): Json<DebugUpdate>) -> Response {
    match state.notifier.set_debug(update.enabled).await {
        Ok(()) => Json(json!({ "status": "success", "debug": update.enabled })).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "web": "ok",
            "scheduler": if state.scheduler.is_running().await { "ok" } else { "stopped" },
            "monitor": "ok",
        },
    }))
}
