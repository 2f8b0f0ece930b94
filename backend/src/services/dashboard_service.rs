use crate::analytics::{
    default_selection, item_options, render_filterable_chart, summarize, summary_table, ChartView,
    MarketSummary, PriceRow,
};
use crate::config::Config;
use crate::error::StorageError;
use crate::models::token_display_name;
use crate::storage::TimeSeriesTable;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::Path;

pub const NO_DATA_MESSAGE: &str =
    "No market data yet. Waiting for the first collection run to write the price history.";

const RELEASE_LABEL: &str = "Midnight release";
const COLLECTION_NOTE: &str =
    "Prices are collected every hour from the official Battle.net auction-house API (Korean region).";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Countdown {
    pub label: String,
    pub release_date: NaiveDate,
    /// Whole days until release, negative once it has passed
    pub days_left: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sidebar {
    pub countdown: Countdown,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub summary: Option<MarketSummary>,
    pub items: Vec<String>,
    pub default_selection: Vec<String>,
    pub price_table: Vec<PriceRow>,
    pub sidebar: Sidebar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardView {
    NoData { message: String, sidebar: Sidebar },
    Ready(Box<DashboardSnapshot>),
}

/// Reads the price history for one request. `None` means the collector has
/// not written it yet.
pub fn load(path: &Path) -> Result<Option<TimeSeriesTable>, StorageError> {
    TimeSeriesTable::load(path)
}

/// Days from `now` until midnight of `release_date`, rounded down.
pub fn days_until(release_date: NaiveDate, now: NaiveDateTime) -> i64 {
    let release = release_date.and_hms_opt(0, 0, 0).unwrap_or(now);
    (release - now).num_seconds().div_euclid(86_400)
}

pub fn sidebar(config: &Config, now: NaiveDateTime) -> Sidebar {
    Sidebar {
        countdown: Countdown {
            label: RELEASE_LABEL.to_string(),
            release_date: config.release_date,
            days_left: days_until(config.release_date, now),
        },
        note: COLLECTION_NOTE.to_string(),
    }
}

pub fn build_dashboard(config: &Config, now: NaiveDateTime) -> Result<DashboardView, StorageError> {
    let sidebar = sidebar(config, now);
    let Some(table) = load(&config.history_path())? else {
        return Ok(DashboardView::NoData {
            message: NO_DATA_MESSAGE.to_string(),
            sidebar,
        });
    };

    Ok(DashboardView::Ready(Box::new(DashboardSnapshot {
        summary: summarize(&table, token_display_name(), config.token_retail_price),
        items: item_options(&table),
        default_selection: default_selection(&table),
        price_table: summary_table(&table),
        sidebar,
    })))
}

/// `selected = None` draws the default selection.
pub fn build_chart(config: &Config, selected: Option<Vec<String>>) -> Result<Option<ChartView>, StorageError> {
    let Some(table) = load(&config.history_path())? else {
        return Ok(None);
    };
    let selected = selected.unwrap_or_else(|| default_selection(&table));
    Ok(Some(render_filterable_chart(&table, &selected)))
}

pub fn build_price_table(config: &Config) -> Result<Option<Vec<PriceRow>>, StorageError> {
    Ok(load(&config.history_path())?.map(|table| summary_table(&table)))
}
