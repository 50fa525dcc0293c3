//! API route definitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use super::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/widgets", get(list_widgets))
        .route("/widgets/{channel}", get(widget_report))
        .route("/runs", get(list_runs))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let last_run = state.runs.last().await;
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "tracked_jobs": state.tracked_jobs,
            "last_run": last_run,
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn list_widgets(State(state): State<AppState>) -> Json<Value> {
    let channels = state.board.channels().await;
    Json(json!({ "data": channels, "meta": { "total": channels.len() } }))
}

async fn widget_report(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.board.get(&channel).await {
        Some(published) => (
            StatusCode::OK,
            Json(json!({
                "data": published.report,
                "meta": {
                    "channel": published.channel,
                    "published_at": published.published_at.to_rfc3339(),
                }
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "data": null,
                "meta": { "message": format!("no report published on '{}' yet", channel) }
            })),
        ),
    }
}

async fn list_runs(State(state): State<AppState>) -> Json<Value> {
    let runs = state.runs.recent().await;
    Json(json!({ "meta": { "total": runs.len() }, "data": runs }))
}
