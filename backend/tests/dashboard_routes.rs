use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::PathBuf;
use tower::ServiceExt;
use tracker_backend::{build_router, config::Config, state::AppState};

const HISTORY: &str = "\u{feff}item_name,2025-01-01 10:00,2025-01-01 11:00\n\
WoW 토큰,150000,151500\n\
창연,3,3.3\n\
X,10,12\n\
Y,20,18\n";

fn scratch_config(history: Option<&str>) -> Config {
    let data_dir: PathBuf =
        std::env::temp_dir().join(format!("tracker-routes-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&data_dir).unwrap();
    let config = Config {
        data_dir,
        ..Config::default()
    };
    if let Some(history) = history {
        std::fs::write(config.history_path(), history).unwrap();
    }
    config
}

fn app(history: Option<&str>) -> Router {
    build_router(AppState::new(scratch_config(history)))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_dashboard_without_history_reports_no_data() {
    let (status, body) = get_json(app(None), "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_data");
    assert!(body["message"].as_str().unwrap().contains("No market data"));
    assert!(body["sidebar"]["countdown"]["days_left"].is_i64());
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn test_chart_and_prices_without_history_are_not_found() {
    let (status, _) = get_json(app(None), "/api/chart").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(app(None), "/api/prices").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_summary() {
    let (status, body) = get_json(app(Some(HISTORY)), "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let summary = &body["summary"];
    assert_eq!(summary["latest_column"], "2025-01-01 11:00");
    assert_eq!(summary["previous_column"], "2025-01-01 10:00");
    assert_eq!(summary["token_price"], 151500.0);
    assert_eq!(summary["token_delta"], 1500.0);
    assert_eq!(summary["tracked_items"], 4);
    assert_eq!(summary["top_riser"]["item"], "X");

    assert_eq!(body["default_selection"], serde_json::json!(["WoW 토큰", "창연"]));
    assert_eq!(body["price_table"][0]["item"], "WoW 토큰");
    assert_eq!(body["price_table"][3]["item"], "창연");
}

#[tokio::test]
async fn test_chart_with_empty_selection_prompts() {
    let (status, body) = get_json(app(Some(HISTORY)), "/api/chart?items=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "prompt");
    assert!(body.get("series").is_none());
}

#[tokio::test]
async fn test_chart_with_selection() {
    let (status, body) = get_json(app(Some(HISTORY)), "/api/chart?items=X,Y").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "chart");
    assert_eq!(body["series"].as_array().unwrap().len(), 2);
    assert_eq!(body["series"][1]["item"], "Y");
    assert_eq!(body["hours"], serde_json::json!(["2025-01-01 10:00", "2025-01-01 11:00"]));
}

#[tokio::test]
async fn test_prices_sorted_descending() {
    let (status, body) = get_json(app(Some(HISTORY)), "/api/prices").await;

    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![151500.0, 18.0, 12.0, 3.3]);
}
