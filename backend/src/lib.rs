pub mod analytics;
pub mod api_client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{routing::get, Router};
use state::AppState;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Dashboard API under `/api`, with the built frontend served for every other path.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let api_routes = Router::new()
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/chart", get(routes::chart::get_chart))
        .route("/prices", get(routes::prices::get_prices));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Fresh empty directory under the system temp dir.
    pub fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tracker-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
