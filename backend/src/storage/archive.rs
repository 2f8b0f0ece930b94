use super::UTF8_BOM;
use crate::error::StorageError;
use crate::models::Listing;
use chrono::NaiveDateTime;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Dumps the raw snapshot to `raw_dir/snapshot_<YYYYMMDD_HHMMSS>.csv`.
/// Existing archives are never overwritten and nothing reads them back.
pub fn archive_snapshot(
    raw_dir: &Path,
    listings: &[Listing],
    taken_at: NaiveDateTime,
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(raw_dir)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for listing in listings {
        writer.serialize(listing)?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))?;

    let stem = format!("snapshot_{}", taken_at.format("%Y%m%d_%H%M%S"));
    let mut path = raw_dir.join(format!("{}.csv", stem));

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            path = raw_dir.join(format!("{}_{}.csv", stem, Uuid::new_v4().simple()));
            OpenOptions::new().write(true).create_new(true).open(&path)?
        }
        Err(e) => return Err(e.into()),
    };

    file.write_all(UTF8_BOM.as_bytes())?;
    file.write_all(&body)?;
    Ok(path)
}
