//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.
//! Shared by the database file and the YAML configuration.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::LockboxError;

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all. Parent
/// directories are created as needed.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read JSON from a file, returning `None` if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<Option<T>, LockboxError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .map_err(|e| LockboxError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map(Some)
        .map_err(|e| LockboxError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), LockboxError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let contents = serde_json::to_vec_pretty(data)
        .map_err(|e| LockboxError::Storage(format!("Failed to serialize data: {}", e)))?;

    write_atomic(path, &contents).map_err(|e| {
        LockboxError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })
}
