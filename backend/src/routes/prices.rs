use super::{no_data, storage_failure, ApiResult};
use crate::analytics::PriceRow;
use crate::services::dashboard_service;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn get_prices(State(state): State<AppState>) -> ApiResult<Vec<PriceRow>> {
    match dashboard_service::build_price_table(&state.config) {
        Ok(Some(rows)) => Ok(Json(rows)),
        Ok(None) => Err(no_data()),
        Err(e) => Err(storage_failure(e)),
    }
}
