//! Key/value "local storage" persisted as a small JSON file.
//!
//! Holds UI preferences between runs. A missing or unreadable file starts
//! empty; writes go straight to disk.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default)]
pub struct LocalStorage {
    /// `None` keeps everything in memory.
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Load storage backed by the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Ignoring unreadable local storage: {}", e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    /// Storage that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store `value` under `key`. Memory only changes once the file is written.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value.into());
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}
