pub mod chart;
pub mod dashboard;
pub mod prices;

use crate::error::StorageError;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub(crate) fn storage_failure(err: StorageError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Failed to read price history: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Failed to read price history: {}", err),
        }),
    )
}

pub(crate) fn no_data() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: crate::services::dashboard_service::NO_DATA_MESSAGE.to_string(),
        }),
    )
}
