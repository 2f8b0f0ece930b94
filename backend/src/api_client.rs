use crate::config::{Config, Credentials};
use crate::error::ApiError;
use crate::models::{copper_to_gold, FetchOutcome, ItemId, Listing};
use crate::storage::item_dict::placeholder_name;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// The calls a collection run makes against the auction-house API.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Client-credentials grant. Any failure aborts the run.
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// Full commodity order book. Any failure aborts the run.
    async fn fetch_commodity_snapshot(&self, token: &str) -> Result<Vec<Listing>, ApiError>;

    /// Token index price in gold; best effort.
    async fn fetch_token_price(&self, token: &str) -> FetchOutcome<f64>;

    /// Localized item name; falls back to `ID_<n>`.
    async fn resolve_item_name(&self, id: ItemId, token: &str) -> FetchOutcome<String>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct CommoditiesResponse {
    #[serde(default)]
    auctions: Vec<CommodityAuction>,
}

#[derive(Deserialize)]
struct CommodityAuction {
    id: u64,
    item: ItemRef,
    quantity: u64,
    unit_price: u64,
    #[serde(default)]
    time_left: String,
}

#[derive(Deserialize)]
struct ItemRef {
    id: ItemId,
}

#[derive(Deserialize)]
struct TokenIndexResponse {
    price: u64,
}

#[derive(Deserialize)]
struct ItemResponse {
    name: Option<LocalizedName>,
}

/// Item names arrive as a plain string when a locale is requested, or as a
/// map of every locale otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedName {
    Plain(String),
    ByLocale(HashMap<String, String>),
}

impl LocalizedName {
    fn pick(self, locale: &str) -> Option<String> {
        let name = match self {
            LocalizedName::Plain(name) => Some(name),
            LocalizedName::ByLocale(mut names) => names.remove(locale),
        };
        name.filter(|name| !name.trim().is_empty())
    }
}

impl From<CommodityAuction> for Listing {
    fn from(auction: CommodityAuction) -> Self {
        Listing {
            id: auction.id,
            item_id: auction.item.id,
            quantity: auction.quantity,
            unit_price: auction.unit_price,
            time_left: auction.time_left,
        }
    }
}

pub struct ApiClient {
    client: reqwest::Client,
    oauth_url: String,
    base_url: String,
    dynamic_namespace: String,
    static_namespace: String,
    locale: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            oauth_url: config.oauth_url.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            dynamic_namespace: config.dynamic_namespace(),
            static_namespace: config.static_namespace(),
            locale: config.locale.clone(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        token: &str,
        namespace: &str,
        locale: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Battlenet-Namespace", namespace);
        if let Some(locale) = locale {
            request = request.header("locale", locale);
        }

        let response = request.send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(ApiError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl MarketApi for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let response = self
            .client
            .post(&self.oauth_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint: "oauth token",
                status: response.status().as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("oauth token: {}", e)))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingToken)
    }

    async fn fetch_commodity_snapshot(&self, token: &str) -> Result<Vec<Listing>, ApiError> {
        let body: CommoditiesResponse = self
            .get_json(
                "commodities",
                "/data/wow/auctions/commodities",
                token,
                &self.dynamic_namespace,
                None,
            )
            .await?;

        Ok(body.auctions.into_iter().map(Listing::from).collect())
    }

    async fn fetch_token_price(&self, token: &str) -> FetchOutcome<f64> {
        match self
            .get_json::<TokenIndexResponse>(
                "token index",
                "/data/wow/token/index",
                token,
                &self.dynamic_namespace,
                None,
            )
            .await
        {
            Ok(body) => FetchOutcome::Fetched(copper_to_gold(body.price)),
            Err(e) => FetchOutcome::Degraded(e.to_string()),
        }
    }

    async fn resolve_item_name(&self, id: ItemId, token: &str) -> FetchOutcome<String> {
        let path = format!("/data/wow/item/{}", id);
        let result = self
            .get_json::<ItemResponse>(
                "item",
                &path,
                token,
                &self.static_namespace,
                Some(self.locale.as_str()),
            )
            .await;

        match result {
            Ok(body) => match body.name.and_then(|n| n.pick(&self.locale)) {
                Some(name) => FetchOutcome::Fetched(name),
                None => FetchOutcome::Degraded(format!("item {} has no {} name", id, self.locale)),
            },
            Err(e) => FetchOutcome::Degraded(e.to_string()),
        }
    }
}

/// Name to store for an item whose lookup degraded.
pub fn name_or_placeholder(id: ItemId, outcome: &FetchOutcome<String>) -> String {
    outcome
        .fetched()
        .cloned()
        .unwrap_or_else(|| placeholder_name(id))
}
