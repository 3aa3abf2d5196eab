//! Pattern persistence
//!
//! Features:
//! - String key/value [`Storage`] seam (LocalStorage-like)
//! - In-memory and directory-backed stores
//! - Load with fallback to the level's built-in pattern on absence or corruption
//! - Save failures are logged and swallowed

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::sim::{Level, Pattern};
use crate::{NoteFallError, Result};

/// Minimal key/value store
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(NoteFallError::Storage(format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        // Write-then-rename so a crash never leaves a half-written pattern
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Loads and saves authored patterns per level
pub struct PatternRepository<S: Storage> {
    storage: S,
}

impl<S: Storage> PatternRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Persisted pattern if present and valid
    pub fn get(&self, level: &Level) -> Option<Pattern> {
        let key = level.pattern_key();
        let json = match self.storage.get_item(&key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Pattern storage unavailable for '{}': {}", level.title, e);
                return None;
            }
        };
        match Pattern::from_json(&json) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("Ignoring corrupt pattern for '{}': {}", level.title, e);
                None
            }
        }
    }

    /// Persisted pattern, or the level's built-in pattern
    pub fn load(&self, level: &Level) -> Pattern {
        match self.get(level) {
            Some(pattern) => {
                log::info!("Loaded authored pattern for '{}' ({} notes)", level.title, pattern.len());
                pattern
            }
            None => level.spawns.clone(),
        }
    }

    /// Level with its authored pattern applied
    pub fn resolve_level(&self, level: &Level) -> Level {
        Level {
            spawns: self.load(level),
            ..level.clone()
        }
    }

    /// Persist a pattern; returns whether it was written
    pub fn save(&mut self, level: &Level, pattern: &Pattern) -> bool {
        let result = pattern
            .to_json()
            .and_then(|json| self.storage.set_item(&level.pattern_key(), &json));
        match result {
            Ok(()) => {
                log::info!("Saved pattern for '{}' ({} notes)", level.title, pattern.len());
                true
            }
            Err(e) => {
                log::warn!("Failed to save pattern for '{}': {}", level.title, e);
                false
            }
        }
    }

    /// Drop the authored pattern so the built-in one is used again
    pub fn reset(&mut self, level: &Level) {
        if let Err(e) = self.storage.remove_item(&level.pattern_key()) {
            log::warn!("Failed to reset pattern for '{}': {}", level.title, e);
        }
    }
}
