//! File-backed persistence: the wide price history, the item name dictionary
//! and the raw snapshot archive.
//!
//! The collector is the only writer. Tables are rewritten in full through a
//! temp file and `rename`, so a reader sees either the old or the new file,
//! never a partial one. Two collectors running at once are not coordinated
//! and the last rename wins.

pub mod archive;
pub mod history;
pub mod item_dict;

pub use archive::archive_snapshot;
pub use history::TimeSeriesTable;
pub use item_dict::ItemDictionary;

use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use uuid::Uuid;

const UTF8_BOM: &str = "\u{feff}";

/// Reads a UTF-8 file, stripping a leading BOM. `Ok(None)` when the file does not exist.
pub(crate) fn read_text(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(
            text.strip_prefix(UTF8_BOM).map(str::to_string).unwrap_or(text),
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes `body` prefixed with a BOM to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, body: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let mut contents = Vec::with_capacity(UTF8_BOM.len() + body.len());
    contents.extend_from_slice(UTF8_BOM.as_bytes());
    contents.extend_from_slice(body);

    if let Err(e) = fs::write(&tmp_path, &contents).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
