//! File writers for deck artifacts. Parent directories are created as needed.

use crate::error::GenError;
use serde::Serialize;
use std::fs;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<(), GenError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GenError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_text(path: &Path, text: String) -> Result<(), GenError> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GenError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text(path, text)
}

/// One compact JSON document per line
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), GenError> {
    let mut text = String::new();
    for row in rows {
        text.push_str(&serde_json::to_string(row)?);
        text.push('\n');
    }
    write_text(path, text)
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), GenError> {
    write_text(path, serde_yaml::to_string(value)?)
}
