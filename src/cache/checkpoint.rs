//! Append-only CSV checkpoint of collected records.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::linkedin::types::JobRecord;

const ID_COLUMN: &str = "job_id";

pub struct CheckpointFile {
  path: PathBuf,
}

impl CheckpointFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// True when the file exists and has content (a header at least).
  pub fn exists(&self) -> bool {
    std::fs::metadata(&self.path)
      .map(|m| m.is_file() && m.len() > 0)
      .unwrap_or(false)
  }

  fn reader(&self) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
      .flexible(true)
      .from_path(&self.path)
      .map_err(|e| eyre!("Failed to open checkpoint {}: {}", self.path.display(), e))
  }

  /// Ids already written, read from the `job_id` column of every usable row.
  pub fn processed_ids(&self) -> HashSet<String> {
    if !self.exists() {
      return HashSet::new();
    }

    match self.read_ids() {
      Ok(ids) => {
        info!(
          processed = ids.len(),
          path = %self.path.display(),
          "Found already processed jobs"
        );
        ids
      }
      Err(err) => {
        error!(path = %self.path.display(), error = %err, "Error reading existing checkpoint");
        HashSet::new()
      }
    }
  }

  fn read_ids(&self) -> Result<HashSet<String>> {
    let mut reader = self.reader()?;
    let headers = reader
      .headers()
      .map_err(|e| eyre!("Failed to read checkpoint header: {}", e))?
      .clone();
    let Some(column) = headers.iter().position(|h| h.trim() == ID_COLUMN) else {
      warn!(path = %self.path.display(), "Checkpoint has no job_id column");
      return Ok(HashSet::new());
    };

    let mut skipped = 0usize;
    let mut ids = HashSet::new();
    for row in reader.records() {
      match row {
        Ok(row) => {
          if let Some(id) = row.get(column).map(str::trim).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
          }
        }
        Err(_) => skipped += 1,
      }
    }
    if skipped > 0 {
      warn!(skipped, "Skipped malformed checkpoint rows");
    }
    Ok(ids)
  }

  /// Every row that deserializes into a full record, in file order.
  pub fn read_records(&self) -> Result<Vec<JobRecord>> {
    if !self.exists() {
      return Ok(Vec::new());
    }

    let mut reader = self.reader()?;
    let mut skipped = 0usize;
    let mut records = Vec::new();
    for row in reader.deserialize::<JobRecord>() {
      match row {
        Ok(record) => records.push(record),
        Err(_) => skipped += 1,
      }
    }
    if skipped > 0 {
      warn!(skipped, path = %self.path.display(), "Skipped unreadable checkpoint rows");
    }
    Ok(records)
  }

  /// Append a batch, writing the header only when the file is new.
  pub fn append(&self, batch: &[JobRecord]) -> bool {
    if batch.is_empty() {
      return true;
    }

    let existed = self.exists();
    match self.write_batch(batch, existed) {
      Ok(()) => {
        let action = if existed { "Appended" } else { "Created new file with" };
        info!(
          "Checkpoint: {} {} jobs to {}",
          action,
          batch.len(),
          self.path.display()
        );
        true
      }
      Err(err) => {
        error!(path = %self.path.display(), error = %err, "Failed to save checkpoint");
        false
      }
    }
  }

  fn write_batch(&self, batch: &[JobRecord], existed: bool) -> Result<()> {
    ensure_parent(&self.path)?;
    let file = OpenOptions::new()
      .create(true)
      .append(existed)
      .write(true)
      .truncate(!existed)
      .open(&self.path)
      .map_err(|e| eyre!("Failed to open {}: {}", self.path.display(), e))?;

    let mut writer = csv::WriterBuilder::new()
      .has_headers(!existed)
      .from_writer(file);
    for record in batch {
      writer
        .serialize(record)
        .map_err(|e| eyre!("Failed to write job {}: {}", record.job_id, e))?;
    }
    writer
      .flush()
      .map_err(|e| eyre!("Failed to flush checkpoint: {}", e))?;
    Ok(())
  }

  /// Replace the whole file with `records` (header included).
  pub fn overwrite(&self, records: &[JobRecord]) -> Result<usize> {
    ensure_parent(&self.path)?;
    let mut writer = csv::Writer::from_path(&self.path)
      .map_err(|e| eyre!("Failed to create {}: {}", self.path.display(), e))?;
    for record in records {
      writer
        .serialize(record)
        .map_err(|e| eyre!("Failed to write job {}: {}", record.job_id, e))?;
    }
    writer.flush()?;
    Ok(records.len())
  }
}

fn ensure_parent(path: &Path) -> Result<()> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create directory {}: {}", parent.display(), e))?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::linkedin::types::{JobIdEntry, WorkModel};
  use chrono::NaiveDate;

  fn record(id: &str) -> JobRecord {
    let entry = JobIdEntry {
      work_model: WorkModel::Remote,
      keyword: "Cientista de Dados".to_string(),
    };
    let date = NaiveDate::from_ymd_opt(2024, 3, 10)
      .unwrap()
      .and_hms_opt(14, 0, 5)
      .unwrap();
    let mut record = JobRecord::new(id, &entry, date);
    record.job_title = Some("Cientista de Dados Pleno".to_string());
    record.location = Some("São Paulo, SP".to_string());
    record.job_description = Some("Requisitos:\nPython, \"SQL\", Spark".to_string());
    record
  }

  #[test]
  fn test_header_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = CheckpointFile::new(dir.path().join("raw/jobs.csv"));

    assert!(checkpoint.append(&[record("1"), record("2")]));
    assert!(checkpoint.append(&[record("3")]));

    let text = std::fs::read_to_string(checkpoint.path()).unwrap();
    assert_eq!(text.matches("job_id,work_model").count(), 1);
    assert!(text.starts_with("job_id,work_model,keyword,scrape_date,job_title"));

    let records = checkpoint.read_records().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], record("1"));
    assert_eq!(records[2].job_id, "3");
  }

  #[test]
  fn test_empty_fields_read_back_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = CheckpointFile::new(dir.path().join("jobs.csv"));
    let mut sparse = record("1");
    sparse.company_name = None;
    sparse.job_sectors = None;

    checkpoint.append(&[sparse.clone()]);

    assert_eq!(checkpoint.read_records().unwrap(), vec![sparse]);
  }

  #[test]
  fn test_malformed_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = CheckpointFile::new(dir.path().join("jobs.csv"));
    checkpoint.append(&[record("1")]);

    let mut text = std::fs::read_to_string(checkpoint.path()).unwrap();
    text.push_str("broken-row-without-columns\n");
    text.push_str("77,Remote,kw,not-a-date\n");
    std::fs::write(checkpoint.path(), text).unwrap();
    checkpoint.append(&[record("2")]);

    let ids = checkpoint.processed_ids();
    assert!(ids.contains("1"));
    assert!(ids.contains("2"));
    assert!(ids.contains("77"));

    let records = checkpoint.read_records().unwrap();
    let read: Vec<_> = records.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(read, vec!["1", "2"]);
  }

  #[test]
  fn test_missing_file_has_no_ids() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = CheckpointFile::new(dir.path().join("absent.csv"));
    assert!(checkpoint.processed_ids().is_empty());
    assert!(checkpoint.read_records().unwrap().is_empty());
  }

  #[test]
  fn test_overwrite_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = CheckpointFile::new(dir.path().join("jobs.csv"));
    checkpoint.append(&[record("1"), record("2")]);

    assert_eq!(checkpoint.overwrite(&[record("9")]).unwrap(), 1);
    let ids = checkpoint.processed_ids();
    assert_eq!(ids.len(), 1);
    assert!(ids.contains("9"));
  }
}
