use super::{storage_failure, ApiResult};
use crate::services::dashboard_service::{self, DashboardView};
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Utc;

/// Summary metrics, filter options, price table and sidebar in one payload.
/// A missing history is a normal `no_data` response, not an error.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardView> {
    let now = match state.config.collection_offset() {
        Ok(offset) => Utc::now().with_timezone(&offset).naive_local(),
        Err(_) => Utc::now().naive_utc(),
    };

    dashboard_service::build_dashboard(&state.config, now)
        .map(Json)
        .map_err(storage_failure)
}
