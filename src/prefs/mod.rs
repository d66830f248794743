use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const PLAYER_VOLUME: &str = "playerVolume";
pub const ACTIVE_VIDEO: &str = "activeVideo";
pub const PLAYER_VIDEOS: &str = "playerVideos";

/// Durable key-value storage for user preferences.
///
/// Reads must observe every preceding write made through the same store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Typed reads and writes on top of any [`PreferenceStore`].
pub trait PreferenceStoreExt: PreferenceStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => match serde_json::from_value(value) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(e) => {
                    warn!("Ignoring unreadable preference '{}': {}", key, e);
                    Ok(None)
                }
            },
        }
    }

    fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::StoreUnavailable(format!("cannot encode '{}': {}", key, e)))?;
        self.set(key, value)
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStoreExt for S {}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON document on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| unavailable(&path, e))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| unavailable(&path, e))?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened preference store at {}", path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| unavailable(&self.path, e))?;
        }

        let json =
            serde_json::to_string_pretty(&self.values).map_err(|e| unavailable(&self.path, e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| unavailable(&self.path, e))
    }
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::StoreUnavailable(format!("{}: {}", path.display(), e))
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if let Some(previous) = self.values.remove(key) {
            if let Err(e) = self.flush() {
                self.values.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }
}
