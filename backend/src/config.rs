use crate::error::ConfigError;
use chrono::{FixedOffset, NaiveDate};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CLIENT_ID_FILE: &str = "clientid.txt";
const CLIENT_SECRET_FILE: &str = "secret.txt";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub oauth_url: String,
    pub api_base_url: String,
    pub region: String,
    pub locale: String,
    pub utc_offset_hours: i32,
    pub top_n: usize,
    pub collect_interval_secs: Option<u64>,
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub release_date: NaiveDate,
    pub token_retail_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            config_dir: PathBuf::from("config"),
            oauth_url: "https://oauth.battle.net/token".to_string(),
            api_base_url: "https://kr.api.blizzard.com".to_string(),
            region: "kr".to_string(),
            locale: "ko_KR".to_string(),
            utc_offset_hours: 9,
            top_n: 20,
            collect_interval_secs: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from("static"),
            release_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or(NaiveDate::MIN),
            token_retail_price: 22_000.0,
        }
    }
}

impl Config {
    /// Reads settings from the environment (after loading `.env` if present).
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Ok(Self {
            data_dir: env_or("DATA_DIR", defaults.data_dir)?,
            config_dir: env_or("CONFIG_DIR", defaults.config_dir)?,
            oauth_url: env_or("OAUTH_URL", defaults.oauth_url)?,
            api_base_url: env_or("API_BASE_URL", defaults.api_base_url)?,
            region: env_or("API_REGION", defaults.region)?,
            locale: env_or("API_LOCALE", defaults.locale)?,
            utc_offset_hours: env_or("COLLECT_TZ_OFFSET_HOURS", defaults.utc_offset_hours)?,
            top_n: env_or("TOP_N", defaults.top_n)?,
            collect_interval_secs: match std::env::var("COLLECT_INTERVAL_SECS") {
                Ok(raw) => Some(parse_value("COLLECT_INTERVAL_SECS", &raw)?),
                Err(_) => None,
            },
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr)?,
            static_dir: env_or("STATIC_DIR", defaults.static_dir)?,
            release_date: env_or("RELEASE_DATE", defaults.release_date)?,
            token_retail_price: env_or("TOKEN_RETAIL_PRICE", defaults.token_retail_price)?,
        })
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("market_history.csv")
    }

    pub fn item_dict_path(&self) -> PathBuf {
        self.data_dir.join("item_dict.csv")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn dynamic_namespace(&self) -> String {
        format!("dynamic-{}", self.region)
    }

    pub fn static_namespace(&self) -> String {
        format!("static-{}", self.region)
    }

    pub fn collection_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or(ConfigError::InvalidValue {
            name: "COLLECT_TZ_OFFSET_HOURS",
            value: self.utc_offset_hours.to_string(),
        })
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

/// OAuth client credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env(config_dir: &Path) -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var("WOW_CLIENT_ID").ok(),
            std::env::var("WOW_CLIENT_SECRET").ok(),
            config_dir,
        )
    }

    /// Environment values win when both are present and non-empty; otherwise
    /// both halves are read from the secret files in `config_dir`.
    pub fn resolve(
        env_id: Option<String>,
        env_secret: Option<String>,
        config_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let env_id = env_id.filter(|v| !v.trim().is_empty());
        let env_secret = env_secret.filter(|v| !v.trim().is_empty());
        if let (Some(client_id), Some(client_secret)) = (env_id, env_secret) {
            return Ok(Self {
                client_id: client_id.trim().to_string(),
                client_secret: client_secret.trim().to_string(),
            });
        }

        let id_path = config_dir.join(CLIENT_ID_FILE);
        let secret_path = config_dir.join(CLIENT_SECRET_FILE);
        let missing = || ConfigError::MissingCredentials(config_dir.display().to_string());

        let client_id = read_secret(&id_path).ok_or_else(missing)?;
        let client_secret = read_secret(&secret_path).ok_or_else(missing)?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

fn read_secret(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
