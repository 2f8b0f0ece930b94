//! Collector entry point. Runs once and exits, unless `COLLECT_INTERVAL_SECS`
//! is set, in which case it keeps collecting on that interval.

use chrono::Utc;
use std::process::ExitCode;
use std::time::Duration;
use tracker_backend::api_client::ApiClient;
use tracker_backend::config::{Config, Credentials};
use tracker_backend::error::CollectorError;
use tracker_backend::services::collector_service;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CollectorError> {
    let config = Config::from_env()?;
    // Credentials are checked before any request goes out.
    let credentials = Credentials::from_env(&config.config_dir)?;
    let api = ApiClient::new(&config);

    match config.collect_interval_secs {
        Some(secs) if secs > 0 => {
            collector_service::run_schedule(&api, &config, &credentials, Duration::from_secs(secs))
                .await;
            Ok(())
        }
        _ => {
            collector_service::run_collection(&api, &config, &credentials, Utc::now()).await?;
            Ok(())
        }
    }
}
