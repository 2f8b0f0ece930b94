use super::{read_text, write_atomic};
use crate::error::StorageError;
use crate::models::{ItemId, STABLE_TARGETS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const PLACEHOLDER_PREFIX: &str = "ID_";

#[derive(Debug, Serialize, Deserialize)]
struct DictRow {
    item_id: String,
    item_name: String,
}

/// Persisted item id → display name cache. Entries are only ever added or
/// upgraded from a placeholder to a resolved name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDictionary {
    names: BTreeMap<ItemId, String>,
}

impl ItemDictionary {
    /// Dictionary containing only the stable allowlist.
    pub fn seeded() -> Self {
        let mut dict = Self::default();
        dict.add_stable_targets();
        dict
    }

    pub fn load(path: &Path) -> Result<Option<Self>, StorageError> {
        let Some(text) = read_text(path)? else {
            return Ok(None);
        };

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let mut dict = Self::default();
        for row in reader.deserialize::<DictRow>() {
            let row = row?;
            let id = parse_item_id(&row.item_id)?;
            dict.names.insert(id, row.item_name.trim().to_string());
        }
        Ok(Some(dict))
    }

    /// Loads the dictionary, or seeds it on the first run. Stable items are
    /// always present afterwards.
    pub fn load_or_seed(path: &Path) -> Result<Self, StorageError> {
        match Self::load(path)? {
            Some(mut dict) => {
                dict.add_stable_targets();
                Ok(dict)
            }
            None => Ok(Self::seeded()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for (id, name) in &self.names {
            writer.serialize(DictRow {
                item_id: id.to_string(),
                item_name: name.clone(),
            })?;
        }
        let body = writer
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))?;
        write_atomic(path, &body)
    }

    pub fn get(&self, id: ItemId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.names.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when the id is unknown or only has a placeholder name.
    pub fn needs_resolution(&self, id: ItemId) -> bool {
        self.get(id).map_or(true, |name| is_placeholder(id, name))
    }

    /// Stores `name` for `id`. A placeholder never replaces a resolved name.
    /// Returns the previous name when it changed.
    pub fn record(&mut self, id: ItemId, name: String) -> Option<String> {
        match self.names.get(&id) {
            Some(existing) if *existing == name => None,
            Some(existing) if is_placeholder(id, &name) && !is_placeholder(id, existing) => None,
            _ => self.names.insert(id, name),
        }
    }

    fn add_stable_targets(&mut self) {
        for (id, name) in STABLE_TARGETS {
            self.names.entry(id).or_insert_with(|| name.to_string());
        }
    }
}

pub fn placeholder_name(id: ItemId) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, id)
}

pub fn is_placeholder(id: ItemId, name: &str) -> bool {
    name == placeholder_name(id)
}

fn parse_item_id(raw: &str) -> Result<ItemId, StorageError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<ItemId>()
        // older writers sometimes emitted ids as floats ("210932.0")
        .or_else(|_| match trimmed.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as ItemId),
            _ => Err(()),
        })
        .map_err(|_| StorageError::BadItemId(raw.to_string()))
}
