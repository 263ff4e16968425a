use std::path::PathBuf;
use tracing::info;

use super::storage::CacheFile;
use crate::linkedin::types::{JobIdEntry, JobRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
  /// job id -> discovery provenance
  JobIds,
  /// job id -> full record
  JobData,
}

/// The two job caches, owned for the lifetime of one run.
///
/// Mutations stay in memory until a caller saves a kind.
pub struct CacheStore {
  ids: CacheFile<JobIdEntry>,
  data: CacheFile<JobRecord>,
}

impl CacheStore {
  pub fn open(ids_path: impl Into<PathBuf>, data_path: impl Into<PathBuf>) -> Self {
    let store = Self {
      ids: CacheFile::open(ids_path),
      data: CacheFile::open(data_path),
    };
    info!(
      job_ids = store.ids.len(),
      job_records = store.data.len(),
      "Cache store opened"
    );
    store
  }

  pub fn save(&self, kind: CacheKind) -> bool {
    match kind {
      CacheKind::JobIds => self.ids.save(),
      CacheKind::JobData => self.data.save(),
    }
  }

  pub fn save_all(&self) -> bool {
    let data_ok = self.save(CacheKind::JobData);
    let ids_ok = self.save(CacheKind::JobIds);
    data_ok && ids_ok
  }

  pub fn ids(&self) -> &CacheFile<JobIdEntry> {
    &self.ids
  }

  pub fn records(&self) -> &CacheFile<JobRecord> {
    &self.data
  }

  /// Register a discovered id. Known ids keep their first provenance.
  pub fn add_id(&mut self, job_id: &str, entry: JobIdEntry) -> bool {
    self.ids.insert_new(job_id, entry)
  }

  pub fn record(&self, job_id: &str) -> Option<&JobRecord> {
    self.data.get(job_id)
  }

  pub fn store_record(&mut self, record: JobRecord) {
    let key = record.job_id.clone();
    self.data.put(&key, record);
  }
}
