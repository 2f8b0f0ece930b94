use super::{read_text, write_atomic};
use crate::error::StorageError;
use crate::models::HourLabel;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

const ROW_LABEL_HEADER: &str = "item_name";

/// Wide price history: one row per item name, one column per collection hour.
///
/// Columns live in a `BTreeSet<HourLabel>`, so they are always in
/// chronological order and an hour can appear at most once. Rows keep the
/// order in which they were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    columns: BTreeSet<HourLabel>,
    rows: Vec<String>,
    cells: HashMap<String, BTreeMap<HourLabel, f64>>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(None)` when no table has been written yet.
    pub fn load(path: &Path) -> Result<Option<Self>, StorageError> {
        match read_text(path)? {
            Some(text) => Ok(Some(Self::parse(&text)?)),
            None => Ok(None),
        }
    }

    pub fn load_or_empty(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::load(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_atomic(path, &self.to_csv()?)
    }

    pub fn parse(text: &str) -> Result<Self, StorageError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let hours = reader
            .headers()?
            .iter()
            .skip(1)
            .map(str::parse::<HourLabel>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut table = Self::new();
        table.columns.extend(hours.iter().copied());

        for record in reader.records() {
            let record = record?;
            let name = match record.get(0).map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            table.ensure_row(&name);

            for (hour, raw) in hours.iter().zip(record.iter().skip(1)) {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                match raw.parse::<f64>() {
                    Ok(price) if price.is_finite() => table.set(&name, *hour, price),
                    _ => tracing::warn!("Ignoring non-numeric cell {:?} for {} at {}", raw, name, hour),
                }
            }
        }

        Ok(table)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, StorageError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![ROW_LABEL_HEADER.to_string()];
        header.extend(self.columns.iter().map(|h| h.to_string()));
        writer.write_record(&header)?;

        for name in &self.rows {
            let mut record = vec![name.clone()];
            record.extend(self.columns.iter().map(|hour| {
                self.get(name, hour)
                    .map(|price| price.to_string())
                    .unwrap_or_default()
            }));
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))
    }

    /// Columns in ascending time order.
    pub fn columns(&self) -> impl DoubleEndedIterator<Item = &HourLabel> + ExactSizeIterator {
        self.columns.iter()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn latest_column(&self) -> Option<HourLabel> {
        self.columns.iter().next_back().copied()
    }

    /// Second-latest column, or the latest when only one exists.
    pub fn previous_column(&self) -> Option<HourLabel> {
        let mut rev = self.columns.iter().rev();
        let latest = rev.next()?;
        Some(*rev.next().unwrap_or(latest))
    }

    pub fn item_names(&self) -> &[String] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    pub fn contains_row(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn get(&self, name: &str, hour: &HourLabel) -> Option<f64> {
        self.cells.get(name).and_then(|row| row.get(hour)).copied()
    }

    /// Present cells of one row, in time order.
    pub fn row(&self, name: &str) -> impl Iterator<Item = (HourLabel, f64)> + '_ {
        self.cells
            .get(name)
            .into_iter()
            .flat_map(|row| row.iter().map(|(hour, price)| (*hour, *price)))
    }

    /// Writes one cell, overwriting any earlier value for the same hour.
    pub fn set(&mut self, name: &str, hour: HourLabel, price: f64) {
        self.ensure_row(name);
        self.columns.insert(hour);
        if let Some(row) = self.cells.get_mut(name) {
            row.insert(hour, price);
        }
    }

    pub fn remove_row(&mut self, name: &str) -> bool {
        if self.cells.remove(name).is_none() {
            return false;
        }
        self.rows.retain(|r| r != name);
        true
    }

    /// Moves the cells of `from` under `to`. Cells already present in `to` win.
    pub fn rename_row(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let Some(moved) = self.cells.remove(from) else {
            return false;
        };

        if self.cells.contains_key(to) {
            self.rows.retain(|r| r != from);
        } else if let Some(slot) = self.rows.iter_mut().find(|r| r.as_str() == from) {
            *slot = to.to_string();
        }

        let target = self.cells.entry(to.to_string()).or_default();
        for (hour, price) in moved {
            target.entry(hour).or_insert(price);
        }
        true
    }

    fn ensure_row(&mut self, name: &str) {
        if !self.cells.contains_key(name) {
            self.rows.push(name.to_string());
            self.cells.insert(name.to_string(), BTreeMap::new());
        }
    }
}
