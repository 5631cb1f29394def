pub mod app_state;
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use app_state::AppState;
use constants::CARS_ROUTE;
use handlers::{car, health};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest(CARS_ROUTE, car::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
