//! Error types for the collector and the dashboard read path.

use thiserror::Error;

/// Startup configuration problems. Always fatal, raised before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("credentials not found: set WOW_CLIENT_ID/WOW_CLIENT_SECRET or provide {0}")]
    MissingCredentials(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Failures talking to the auction-house API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("token endpoint response had no access_token")]
    MissingToken,
}

/// Failures reading or writing the persisted tables.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid hour label: {0}")]
    BadHourLabel(String),

    #[error("invalid item id: {0}")]
    BadItemId(String),
}

/// Anything that aborts a collection run.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
