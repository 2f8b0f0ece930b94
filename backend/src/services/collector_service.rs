use crate::api_client::{name_or_placeholder, MarketApi};
use crate::config::{Config, Credentials};
use crate::error::CollectorError;
use crate::models::{FetchOutcome, HourLabel, LEGACY_ALIASES};
use crate::services::tracking::{compute_current_prices, select_tracked_items};
use crate::storage::{archive_snapshot, ItemDictionary, TimeSeriesTable};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

/// What one collection run did.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub hour: HourLabel,
    pub listings: usize,
    pub tracked: usize,
    pub prices_written: usize,
    pub names_resolved: usize,
    pub placeholders: usize,
    pub token_price: FetchOutcome<f64>,
    pub archive_path: PathBuf,
}

/// One collection run.
///
/// Authentication and the commodity snapshot are all-or-nothing: if either
/// fails nothing is written. Token price and item names degrade instead.
pub async fn run_collection<A: MarketApi + ?Sized>(
    api: &A,
    config: &Config,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> Result<CollectionReport, CollectorError> {
    let local = now.with_timezone(&config.collection_offset()?).naive_local();
    let hour = HourLabel::from_datetime(local);

    let token = api.authenticate(credentials).await?;

    let listings = match api.fetch_commodity_snapshot(&token).await {
        Ok(listings) => listings,
        Err(e) => {
            error!("Commodity snapshot failed, abandoning {} run: {}", hour, e);
            return Err(e.into());
        }
    };
    info!("Fetched {} commodity listings", listings.len());

    let archive_path = archive_snapshot(&config.raw_dir(), &listings, local)?;

    let dict_path = config.item_dict_path();
    let mut dict = ItemDictionary::load_or_seed(&dict_path)?;
    let tracked = select_tracked_items(&listings, &dict, config.top_n);

    let mut renames = Vec::new();
    let mut names_resolved = 0;
    let mut placeholders = 0;
    for id in tracked.iter() {
        if !dict.needs_resolution(id) {
            continue;
        }
        let outcome = api.resolve_item_name(id, &token).await;
        match &outcome {
            FetchOutcome::Fetched(name) => {
                info!("Resolved item {} as {}", id, name);
                names_resolved += 1;
            }
            FetchOutcome::Degraded(reason) => {
                warn!("Name lookup for item {} failed, using placeholder: {}", id, reason);
                placeholders += 1;
            }
        }
        let name = name_or_placeholder(id, &outcome);
        if let Some(previous) = dict.record(id, name.clone()) {
            renames.push((previous, name));
        }
    }
    dict.save(&dict_path)?;

    let token_price = api.fetch_token_price(&token).await;
    if let FetchOutcome::Degraded(reason) = &token_price {
        warn!("Token price unavailable: {}", reason);
    }

    let prices = compute_current_prices(&listings, &tracked, &token_price);

    let history_path = config.history_path();
    let mut table = TimeSeriesTable::load_or_empty(&history_path)?;
    for alias in LEGACY_ALIASES {
        if table.remove_row(alias) {
            info!("Dropped legacy row {}", alias);
        }
    }
    for (from, to) in &renames {
        if table.rename_row(from, to) {
            info!("Renamed row {} to {}", from, to);
        }
    }

    let mut prices_written = 0;
    for id in tracked.iter() {
        if let (Some(name), Some(price)) = (dict.get(id), prices.get(&id)) {
            table.set(name, hour, *price);
            prices_written += 1;
        }
    }
    table.save(&history_path)?;

    info!("{} collection complete: {} prices written", hour, prices_written);
    match token_price.fetched() {
        Some(price) => info!("Current token price: {:.0} gold", price),
        None => info!("Current token price: unavailable"),
    }

    Ok(CollectionReport {
        hour,
        listings: listings.len(),
        tracked: tracked.len(),
        prices_written,
        names_resolved,
        placeholders,
        token_price,
        archive_path,
    })
}

/// Runs a collection on every tick. A failed run is logged and the next tick
/// proceeds as usual.
pub async fn run_schedule<A: MarketApi + ?Sized>(
    api: &A,
    config: &Config,
    credentials: &Credentials,
    every: Duration,
) {
    let mut interval = time::interval(every);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    info!("Starting collection schedule ({}s interval)", every.as_secs());

    loop {
        interval.tick().await;

        match run_collection(api, config, credentials, Utc::now()).await {
            Ok(report) => info!(
                "Scheduled run for {} wrote {} prices ({} tracked)",
                report.hour, report.prices_written, report.tracked
            ),
            Err(e) => error!("Scheduled collection failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{ItemId, Listing, TOKEN_ITEM_ID};
    use crate::test_support::scratch_dir;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeApi {
        listings: Vec<Listing>,
        snapshot_status: Option<u16>,
        auth_fails: bool,
        token_price: FetchOutcome<f64>,
        names: HashMap<ItemId, String>,
        lookups: Mutex<Vec<ItemId>>,
    }

    impl FakeApi {
        fn new(listings: Vec<Listing>) -> Self {
            Self {
                listings,
                snapshot_status: None,
                auth_fails: false,
                token_price: FetchOutcome::Fetched(150.0),
                names: HashMap::new(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn with_name(mut self, id: ItemId, name: &str) -> Self {
            self.names.insert(id, name.to_string());
            self
        }

        fn lookups(&self) -> Vec<ItemId> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketApi for FakeApi {
        async fn authenticate(&self, _credentials: &Credentials) -> Result<String, ApiError> {
            if self.auth_fails {
                Err(ApiError::Status {
                    endpoint: "oauth token",
                    status: 401,
                })
            } else {
                Ok("token".to_string())
            }
        }

        async fn fetch_commodity_snapshot(&self, _token: &str) -> Result<Vec<Listing>, ApiError> {
            match self.snapshot_status {
                Some(status) => Err(ApiError::Status {
                    endpoint: "commodities",
                    status,
                }),
                None => Ok(self.listings.clone()),
            }
        }

        async fn fetch_token_price(&self, _token: &str) -> FetchOutcome<f64> {
            self.token_price.clone()
        }

        async fn resolve_item_name(&self, id: ItemId, _token: &str) -> FetchOutcome<String> {
            self.lookups.lock().unwrap().push(id);
            match self.names.get(&id) {
                Some(name) => FetchOutcome::Fetched(name.clone()),
                None => FetchOutcome::Degraded("item returned status 404".to_string()),
            }
        }
    }

    fn listing(id: u64, item_id: ItemId, quantity: u64, unit_price: u64) -> Listing {
        Listing {
            id,
            item_id,
            quantity,
            unit_price,
            time_left: "LONG".to_string(),
        }
    }

    fn test_config() -> Config {
        Config {
            data_dir: scratch_dir(),
            ..Config::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    /// 2025-01-01 10:xx in KST.
    fn at_kst_ten(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 1, minute, 0).unwrap()
    }

    fn hour(s: &str) -> HourLabel {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_collects_scenario_prices() {
        let config = test_config();
        let api = FakeApi::new(vec![
            listing(1, 1, 100, 50_000),
            listing(2, 2, 5, 20_000),
        ])
        .with_name(1, "A")
        .with_name(2, "B");

        let report = run_collection(&api, &config, &credentials(), at_kst_ten(15))
            .await
            .unwrap();
        assert_eq!(report.hour, hour("2025-01-01 10:00"));
        assert_eq!(report.prices_written, 3);

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        let col = hour("2025-01-01 10:00");
        assert_eq!(table.get("A", &col), Some(5.0));
        assert_eq!(table.get("B", &col), Some(2.0));
        assert_eq!(table.get("WoW 토큰", &col), Some(150.0));
        assert!(report.archive_path.exists());
    }

    #[tokio::test]
    async fn test_snapshot_failure_writes_nothing() {
        let config = test_config();
        let mut seeded = TimeSeriesTable::new();
        seeded.set("A", hour("2025-01-01 09:00"), 4.0);
        seeded.save(&config.history_path()).unwrap();
        let before = std::fs::read(config.history_path()).unwrap();

        let mut api = FakeApi::new(vec![listing(1, 1, 100, 50_000)]);
        api.snapshot_status = Some(503);

        let err = run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Api(ApiError::Status { status: 503, .. })));
        assert_eq!(std::fs::read(config.history_path()).unwrap(), before);
        assert!(!config.item_dict_path().exists());
        assert!(!config.raw_dir().exists());
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_before_snapshot() {
        let config = test_config();
        let mut api = FakeApi::new(vec![listing(1, 1, 100, 50_000)]);
        api.auth_fails = true;

        assert!(run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .is_err());
        assert!(!config.history_path().exists());
    }

    #[tokio::test]
    async fn test_degraded_token_and_names_do_not_abort() {
        let config = test_config();
        let mut api = FakeApi::new(vec![
            listing(1, 7, 100, 30_000),
            listing(2, TOKEN_ITEM_ID, 1, 1_800_000),
        ]);
        api.token_price = FetchOutcome::Degraded("token index returned status 500".into());

        let report = run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .unwrap();
        assert_eq!(report.placeholders, 1);
        assert!(!report.token_price.is_fetched());

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        let col = hour("2025-01-01 10:00");
        assert_eq!(table.get("ID_7", &col), Some(3.0));
        assert_eq!(table.get("WoW 토큰", &col), Some(180.0));
    }

    #[tokio::test]
    async fn test_same_hour_rerun_overwrites_column() {
        let config = test_config();
        let first = FakeApi::new(vec![listing(1, 1, 100, 50_000)]).with_name(1, "A");
        run_collection(&first, &config, &credentials(), at_kst_ten(5))
            .await
            .unwrap();

        let second = FakeApi::new(vec![listing(1, 1, 100, 60_000)]).with_name(1, "A");
        run_collection(&second, &config, &credentials(), at_kst_ten(45))
            .await
            .unwrap();

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.get("A", &hour("2025-01-01 10:00")), Some(6.0));
    }

    #[tokio::test]
    async fn test_known_names_are_not_looked_up_again() {
        let config = test_config();
        let api = FakeApi::new(vec![listing(1, 1, 100, 50_000)]).with_name(1, "A");
        run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .unwrap();
        assert_eq!(api.lookups(), vec![1]);

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
        let api = FakeApi::new(vec![listing(1, 1, 100, 50_000)]).with_name(1, "A");
        run_collection(&api, &config, &credentials(), later).await.unwrap();
        assert!(api.lookups().is_empty());

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        let cols: Vec<String> = table.columns().map(|h| h.to_string()).collect();
        assert_eq!(cols, vec!["2025-01-01 10:00", "2025-01-01 11:00"]);
    }

    #[tokio::test]
    async fn test_placeholder_is_retried_and_row_renamed() {
        let config = test_config();
        let api = FakeApi::new(vec![listing(1, 7, 100, 30_000)]);
        run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .unwrap();

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
        let api = FakeApi::new(vec![listing(1, 7, 100, 33_000)]).with_name(7, "Ore");
        run_collection(&api, &config, &credentials(), later).await.unwrap();
        assert_eq!(api.lookups(), vec![7]);

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        assert!(!table.contains_row("ID_7"));
        assert_eq!(table.get("Ore", &hour("2025-01-01 10:00")), Some(3.0));
        assert_eq!(table.get("Ore", &hour("2025-01-01 11:00")), Some(3.3));
    }

    #[tokio::test]
    async fn test_legacy_alias_row_is_dropped() {
        let config = test_config();
        let mut seeded = TimeSeriesTable::new();
        seeded.set("창연(Bismuth)", hour("2025-01-01 09:00"), 1.0);
        seeded.save(&config.history_path()).unwrap();

        let api = FakeApi::new(vec![listing(1, 210932, 10, 12_000)]);
        run_collection(&api, &config, &credentials(), at_kst_ten(0))
            .await
            .unwrap();

        let table = TimeSeriesTable::load(&config.history_path()).unwrap().unwrap();
        assert!(!table.contains_row("창연(Bismuth)"));
        assert_eq!(table.get("창연", &hour("2025-01-01 10:00")), Some(1.2));
    }
}
