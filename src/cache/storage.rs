//! Single-file JSON storage for a keyed cache.

use color_eyre::{eyre::eyre, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::traits::Cacheable;

/// In-memory mapping mirrored to one JSON file.
///
/// Insertion order is preserved across save/load so iteration follows
/// discovery order.
#[derive(Debug, Clone)]
pub struct CacheFile<T> {
  path: PathBuf,
  entries: IndexMap<String, T>,
}

impl<T: Cacheable> CacheFile<T> {
  /// Open the cache at `path`, starting empty if it is absent or corrupt.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let entries = Self::load(&path);
    Self { path, entries }
  }

  /// Read the mapping stored at `path`. Never fails.
  pub fn load(path: &Path) -> IndexMap<String, T> {
    if !path.exists() {
      return IndexMap::new();
    }

    match Self::read(path) {
      Ok(entries) => {
        info!(
          cache = T::entity_type(),
          entries = entries.len(),
          path = %path.display(),
          "Loaded cache"
        );
        entries
      }
      Err(err) => {
        error!(
          cache = T::entity_type(),
          path = %path.display(),
          error = %err,
          "Failed to load cache, starting empty"
        );
        IndexMap::new()
      }
    }
  }

  fn read(path: &Path) -> Result<IndexMap<String, T>> {
    let bytes = std::fs::read(path).map_err(|e| eyre!("Failed to read cache file: {}", e))?;
    serde_json::from_slice(&bytes).map_err(|e| eyre!("Failed to deserialize cache: {}", e))
  }

  /// Overwrite the file from memory. Returns whether the write landed.
  pub fn save(&self) -> bool {
    match self.write() {
      Ok(()) => {
        info!(
          cache = T::entity_type(),
          entries = self.entries.len(),
          path = %self.path.display(),
          "Cache saved"
        );
        true
      }
      Err(err) => {
        error!(
          cache = T::entity_type(),
          path = %self.path.display(),
          error = %err,
          "Failed to save cache"
        );
        false
      }
    }
  }

  fn write(&self) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
      }
    }

    let data =
      serde_json::to_vec(&self.entries).map_err(|e| eyre!("Failed to serialize cache: {}", e))?;

    // Write beside the target, then swap it in
    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data).map_err(|e| eyre!("Failed to write {}: {}", tmp.display(), e))?;
    std::fs::rename(&tmp, &self.path)
      .map_err(|e| eyre!("Failed to replace {}: {}", self.path.display(), e))?;

    Ok(())
  }

  pub fn get(&self, key: &str) -> Option<&T> {
    self.entries.get(key)
  }

  /// Insert only if absent. Returns whether the key was new.
  pub fn insert_new(&mut self, key: &str, value: T) -> bool {
    if self.entries.contains_key(key) {
      return false;
    }
    self.entries.insert(key.to_string(), value);
    true
  }

  /// Insert or replace, keeping the original position of an existing key.
  pub fn put(&mut self, key: &str, value: T) {
    self.entries.insert(key.to_string(), value);
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
    self.entries.iter()
  }
}
