use axum::{response::Json, routing::get, Router};
use serde_json::json;

use crate::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "message": "Dealership API is healthy"
    }))
}
