//! Core traits for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for values that can live in a keyed cache file.
pub trait Cacheable: Clone + Serialize + DeserializeOwned {
  /// Entity type name used in log lines (e.g., "job_id", "job_data")
  fn entity_type() -> &'static str;
}
