//! Cache maintenance: size report and data-cache export.

use color_eyre::{eyre::eyre, Result};
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::cache::{CacheStore, CheckpointFile};
use crate::config::PathsConfig;
use crate::linkedin::types::JobRecord;

/// Entry counts of each persisted store, `None` when its file is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheReport {
  pub job_ids: Option<usize>,
  pub job_records: Option<usize>,
  pub checkpoint_rows: Option<usize>,
}

impl fmt::Display for CacheReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    count_line(f, "id cache", self.job_ids)?;
    count_line(f, "data cache", self.job_records)?;
    count_line(f, "checkpoint rows", self.checkpoint_rows)
  }
}

fn count_line(f: &mut fmt::Formatter<'_>, name: &str, count: Option<usize>) -> fmt::Result {
  match count {
    Some(n) => writeln!(f, "{:<16}{}", name, n),
    None => writeln!(f, "{:<16}absent", name),
  }
}

pub fn inspect(paths: &PathsConfig) -> Result<CacheReport> {
  let ids_path = paths.job_ids_cache();
  let data_path = paths.job_data_cache();
  let checkpoint = CheckpointFile::new(&paths.checkpoint);
  let store = CacheStore::open(&ids_path, &data_path);

  let report = CacheReport {
    job_ids: ids_path.exists().then(|| store.ids().len()),
    job_records: data_path.exists().then(|| store.records().len()),
    checkpoint_rows: if checkpoint.exists() {
      Some(checkpoint.read_records()?.len())
    } else {
      None
    },
  };

  info!(
    job_ids = ?report.job_ids,
    job_records = ?report.job_records,
    checkpoint_rows = ?report.checkpoint_rows,
    "Inspected caches"
  );
  Ok(report)
}

/// Write every cached record to `out` (the checkpoint path by default),
/// replacing whatever the file held.
pub fn export_cache(paths: &PathsConfig, out: Option<&Path>) -> Result<usize> {
  let data_path = paths.job_data_cache();
  if !data_path.exists() {
    return Err(eyre!("No data cache at {}", data_path.display()));
  }

  let store = CacheStore::open(paths.job_ids_cache(), &data_path);
  let records: Vec<JobRecord> = store
    .records()
    .iter()
    .map(|(_, record)| record.clone())
    .collect();
  let target = CheckpointFile::new(out.unwrap_or(paths.checkpoint.as_path()));
  let written = target.overwrite(&records)?;

  info!(records = written, path = %target.path().display(), "Exported data cache");
  Ok(written)
}
