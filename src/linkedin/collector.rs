use color_eyre::{eyre::eyre, Result};
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

use super::parse::PageParser;
use super::scraper::Scraper;
use super::types::{JobId, JobIdEntry, JobRecord};
use crate::cache::CacheKind;
use crate::fetch::{Pacer, Transport};

/// Records gathered so far plus the batch not yet written to the checkpoint.
#[derive(Default)]
struct Progress {
  collected: Vec<JobRecord>,
  batch: Vec<JobRecord>,
  fetched: usize,
}

impl<T: Transport, P: Pacer> Scraper<T, P> {
  /// Fetch detail pages for every discovered id not yet persisted.
  ///
  /// Ids already in the checkpoint file are reused without a request, ids in
  /// the data cache are reused and written to the checkpoint if missing
  /// there. On success the checkpoint rows merged with this run's records
  /// are returned. If the run is cut short, the pending batch and both
  /// caches are flushed first; the error is returned unless partial
  /// results were requested.
  pub async fn collect(&mut self) -> Result<Vec<JobRecord>> {
    let total = self.store.ids().len();
    info!(total, "Collecting job details");
    if total == 0 {
      warn!("No job ids in cache, run discovery first");
      return Ok(Vec::new());
    }

    let mut progress = Progress::default();
    let outcome = self.collect_pending(&mut progress).await;

    self.flush_batch(&mut progress.batch);
    self.store.save_all();

    match outcome {
      Ok(()) => {
        info!(
          fetched = progress.fetched,
          reused = progress.collected.len() - progress.fetched,
          "Collection finished"
        );
        self.persisted_with(progress.collected)
      }
      Err(err) => {
        error!(error = %err, "Unexpected error during job collection");
        if self.settings.partial_results_on_error {
          self.persisted_with(progress.collected)
        } else {
          Err(err)
        }
      }
    }
  }

  async fn collect_pending(&mut self, progress: &mut Progress) -> Result<()> {
    let parser = PageParser::new()?;
    let pending: Vec<(JobId, JobIdEntry)> = self
      .store
      .ids()
      .iter()
      .map(|(id, entry)| (id.clone(), entry.clone()))
      .collect();

    let processed = self.checkpoint.processed_ids();
    let on_disk = self.checkpoint_records(&processed);
    let mut remaining = pending.len();

    for (job_id, entry) in pending {
      if self.interrupted() {
        return Err(eyre!("Collection interrupted with {} jobs remaining", remaining));
      }
      remaining -= 1;

      if processed.contains(&job_id) {
        info!(%job_id, "Skipping job, already in checkpoint");
        if let Some(record) = on_disk.get(&job_id).or_else(|| self.store.record(&job_id)) {
          progress.collected.push(record.clone());
        }
        continue;
      }

      if let Some(record) = self.store.record(&job_id).cloned() {
        info!(%job_id, "Using cached data");
        progress.collected.push(record.clone());
        progress.batch.push(record);
        self.flush_full_batch(&mut progress.batch);
        continue;
      }

      let url = self.endpoints.job_posting(&job_id);
      let Some(reply) = self.fetcher.fetch(&url).await else {
        warn!(%job_id, remaining, "Failed to fetch job after retries, skipping");
        continue;
      };

      let details = parser.job_details(&reply.body);
      if details.job_description.is_none() {
        warn!(%job_id, "No job description found");
      }
      let record = details.into_record(&job_id, &entry, self.scrape_date);

      progress.collected.push(record.clone());
      progress.batch.push(record.clone());
      self.store.store_record(record);
      progress.fetched += 1;

      let flush_every = self.settings.cache_flush_every;
      if flush_every > 0 && progress.fetched % flush_every == 0 {
        self.store.save(CacheKind::JobData);
      }
      self.flush_full_batch(&mut progress.batch);

      info!(%job_id, remaining, "Processed job");
    }

    Ok(())
  }

  /// Checkpoint rows by id, read only when there is something to reuse.
  fn checkpoint_records(&self, processed: &HashSet<JobId>) -> HashMap<JobId, JobRecord> {
    if processed.is_empty() {
      return HashMap::new();
    }
    match self.checkpoint.read_records() {
      Ok(records) => records
        .into_iter()
        .map(|record| (record.job_id.clone(), record))
        .collect(),
      Err(err) => {
        warn!(error = %err, "Could not reuse checkpoint rows");
        HashMap::new()
      }
    }
  }

  fn flush_full_batch(&self, batch: &mut Vec<JobRecord>) {
    if batch.len() >= self.settings.checkpoint_batch_size.max(1) {
      self.flush_batch(batch);
    }
  }

  /// A failed append keeps the batch for the next flush.
  fn flush_batch(&self, batch: &mut Vec<JobRecord>) {
    if !batch.is_empty() && self.checkpoint.append(batch) {
      batch.clear();
    }
  }

  fn persisted_with(&self, collected: Vec<JobRecord>) -> Result<Vec<JobRecord>> {
    let on_disk = self.checkpoint.read_records()?;
    Ok(merge_by_id(on_disk, collected))
  }
}

/// Concatenate, keeping the first record seen for each id.
fn merge_by_id(first: Vec<JobRecord>, second: Vec<JobRecord>) -> Vec<JobRecord> {
  let mut seen = HashSet::new();
  first
    .into_iter()
    .chain(second)
    .filter(|record| seen.insert(record.job_id.clone()))
    .collect()
}
