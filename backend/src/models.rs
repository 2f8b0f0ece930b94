use crate::error::StorageError;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type ItemId = u64;

/// The API quotes prices in copper; 10,000 copper is one gold.
pub const COPPER_PER_GOLD: f64 = 10_000.0;

pub const TOKEN_ITEM_ID: ItemId = 122284;

/// Items tracked on every run regardless of traded volume.
pub const STABLE_TARGETS: [(ItemId, &str); 3] = [
    (TOKEN_ITEM_ID, "WoW 토큰"),
    (210932, "창연"),
    (221758, "더럽혀진 부싯깃 상자"),
];

/// Row label written by an older collector for item 210932.
pub const LEGACY_ALIASES: [&str; 1] = ["창연(Bismuth)"];

pub fn token_display_name() -> &'static str {
    STABLE_TARGETS[0].1
}

pub fn copper_to_gold(copper: u64) -> f64 {
    copper as f64 / COPPER_PER_GOLD
}

/// One active commodity listing from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub item_id: ItemId,
    pub quantity: u64,
    /// Price per unit in copper
    pub unit_price: u64,
    pub time_left: String,
}

/// Result of a best-effort fetch. `Degraded` carries the reason the value is
/// missing so callers never mistake it for a zero.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Degraded(String),
}

impl<T> FetchOutcome<T> {
    pub fn fetched(&self) -> Option<&T> {
        match self {
            FetchOutcome::Fetched(value) => Some(value),
            FetchOutcome::Degraded(_) => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }
}

/// A collection hour. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourLabel(NaiveDateTime);

impl HourLabel {
    /// Truncates to the start of the hour.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.date().and_hms_opt(at.hour(), 0, 0).unwrap_or(at))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for HourLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:00"))
    }
}

impl FromStr for HourLabel {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
            .map(Self::from_datetime)
            .map_err(|_| StorageError::BadHourLabel(s.to_string()))
    }
}

impl Serialize for HourLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HourLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
