use chrono::{Local, NaiveDateTime, Timelike};
use color_eyre::Result;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::api::Endpoints;
use super::parse::PageParser;
use super::types::WorkModel;
use crate::cache::{CacheStore, CheckpointFile};
use crate::config::Config;
use crate::fetch::{Fetcher, HeaderRotation, Pacer, ReqwestTransport, SystemPacer, Transport};

/// Per-model posting totals for each keyword.
pub type JobCounts = IndexMap<String, BTreeMap<WorkModel, u64>>;

/// Persistence cadence of a collection run.
#[derive(Debug, Clone, Copy)]
pub struct CollectSettings {
  pub checkpoint_batch_size: usize,
  pub cache_flush_every: usize,
  pub partial_results_on_error: bool,
}

impl Default for CollectSettings {
  fn default() -> Self {
    Self {
      checkpoint_batch_size: 20,
      cache_flush_every: 10,
      partial_results_on_error: true,
    }
  }
}

/// Owns the fetcher and all persisted state of one scraping run.
pub struct Scraper<T, P> {
  pub(super) fetcher: Fetcher<T, P>,
  pub(super) store: CacheStore,
  pub(super) checkpoint: CheckpointFile,
  pub(super) endpoints: Endpoints,
  pub(super) settings: CollectSettings,
  pub(super) scrape_date: NaiveDateTime,
  interrupt: Arc<AtomicBool>,
}

impl<T: Transport, P: Pacer> Scraper<T, P> {
  pub fn new(
    fetcher: Fetcher<T, P>,
    store: CacheStore,
    checkpoint: CheckpointFile,
    endpoints: Endpoints,
    settings: CollectSettings,
  ) -> Self {
    let now = Local::now().naive_local();
    Self {
      fetcher,
      store,
      checkpoint,
      endpoints,
      settings,
      scrape_date: now.with_nanosecond(0).unwrap_or(now),
      interrupt: Arc::new(AtomicBool::new(false)),
    }
  }

  /// Share a flag that stops collection between two ids once raised.
  pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
    self.interrupt = interrupt;
    self
  }

  pub(super) fn interrupted(&self) -> bool {
    self.interrupt.load(Ordering::SeqCst)
  }

  #[cfg(test)]
  pub fn store(&self) -> &CacheStore {
    &self.store
  }

  #[cfg(test)]
  pub fn fetcher(&self) -> &Fetcher<T, P> {
    &self.fetcher
  }

  /// Number of postings per work model for each keyword.
  ///
  /// A keyword whose page cannot be fetched maps to an empty table.
  pub async fn count_jobs(&self, keywords: &[String]) -> Result<JobCounts> {
    let parser = PageParser::new()?;
    let mut counts = JobCounts::new();

    for keyword in keywords {
      let url = self.endpoints.search_counts(keyword);
      info!(%keyword, %url, "Fetching job amounts");

      let per_model = match self.fetcher.fetch(&url).await {
        Some(reply) => parser.work_model_counts(&reply.body),
        None => {
          warn!(%keyword, "Failed to fetch job amounts");
          BTreeMap::new()
        }
      };
      counts.insert(keyword.clone(), per_model);
    }

    Ok(counts)
  }
}

impl Scraper<ReqwestTransport, SystemPacer> {
  /// Production scraper over the configured site and cache paths.
  pub fn from_config(config: &Config) -> Result<Self> {
    let scraper_config = &config.scraper;
    let endpoints = Endpoints::new(scraper_config)?;
    let headers = HeaderRotation::new(&scraper_config.user_agents, endpoints.referer());
    let fetcher = Fetcher::system(
      headers,
      scraper_config.max_retries,
      Duration::from_secs(scraper_config.request_timeout_secs),
      Duration::from_secs(scraper_config.backoff_cap_secs),
    )?;

    let store = CacheStore::open(config.paths.job_ids_cache(), config.paths.job_data_cache());
    let checkpoint = CheckpointFile::new(&config.paths.checkpoint);
    let settings = CollectSettings {
      checkpoint_batch_size: scraper_config.checkpoint_batch_size,
      cache_flush_every: scraper_config.cache_flush_every,
      partial_results_on_error: scraper_config.partial_results_on_error,
    };

    Ok(Self::new(fetcher, store, checkpoint, endpoints, settings))
  }
}
