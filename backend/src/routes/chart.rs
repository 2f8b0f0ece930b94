use super::{no_data, storage_failure, ApiResult};
use crate::analytics::ChartView;
use crate::services::dashboard_service;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ChartQuery {
    /// Comma-separated item names. Absent means the default selection;
    /// present but empty means nothing is selected.
    pub items: Option<String>,
}

impl ChartQuery {
    fn selection(&self) -> Option<Vec<String>> {
        self.items.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<ChartView> {
    match dashboard_service::build_chart(&state.config, query.selection()) {
        Ok(Some(view)) => Ok(Json(view)),
        Ok(None) => Err(no_data()),
        Err(e) => Err(storage_failure(e)),
    }
}
