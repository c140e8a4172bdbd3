//! Persistence of the control record.
//!
//! The engine calls the store while holding its exclusion lock, so
//! implementations must be short and synchronous.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use speedctl_config::ControlRecord;

pub trait ConfigStore {
    fn load_config(&self) -> io::Result<ControlRecord>;
    fn save_config(&mut self, record: &ControlRecord) -> io::Result<()>;
    /// Built-in record used for first start and resets.
    fn load_defaults(&self) -> ControlRecord;

    /// Load the stored record, seeding the store with defaults when it is empty.
    fn load_or_seed(&mut self) -> io::Result<ControlRecord> {
        match self.load_config() {
            Ok(r) => Ok(r),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let defaults = self.load_defaults();
                tracing::warn!("no stored record, seeding defaults");
                self.save_config(&defaults)?;
                Ok(defaults)
            }
            Err(e) => Err(e),
        }
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    defaults: ControlRecord,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, defaults: ControlRecord) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load_config(&self) -> io::Result<ControlRecord> {
        let text = fs::read_to_string(&self.path)?;
        ControlRecord::from_json(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("parse {}: {e}", self.path.display()),
            )
        })
    }

    fn save_config(&mut self, record: &ControlRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut text = record
            .to_json_pretty()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        text.push('\n');
        replace_file(&self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "record saved");
        Ok(())
    }

    fn load_defaults(&self) -> ControlRecord {
        self.defaults
    }
}

/// Replace `path` with `bytes` through a synced sibling temp file, so readers
/// see either the old or the new record.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_missing_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("params.json");
        let mut store = JsonFileStore::new(&path, ControlRecord::default());
        let rec = store.load_or_seed().unwrap();
        assert_eq!(rec, ControlRecord::default());
        assert!(path.exists());
        assert_eq!(store.load_config().unwrap(), rec);
    }

    #[test]
    fn garbage_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut store = JsonFileStore::new(&path, ControlRecord::default());
        let err = store.load_or_seed().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        // The broken file is left for the operator to inspect.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn save_replaces_without_leaving_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let mut store = JsonFileStore::new(&path, ControlRecord::default());
        let rec = ControlRecord {
            step_size: 50,
            ..ControlRecord::default()
        };
        store.save_config(&rec).unwrap();
        store.save_config(&rec).unwrap();
        assert_eq!(store.load_config().unwrap(), rec);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
