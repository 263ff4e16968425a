//! Test doubles for the fetch seams and HTML fixtures.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, USER_AGENT};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheStore, CheckpointFile};
use crate::config::ScraperConfig;
use crate::fetch::{BackoffPolicy, Fetcher, HeaderRotation, HttpReply, Pacer, Transport};
use crate::linkedin::{CollectSettings, Endpoints, Scraper};

#[derive(Debug, Clone)]
enum Scripted {
  Reply(HttpReply),
  Fault,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
  pub url: String,
  pub user_agent: Option<String>,
}

/// Replays queued replies in order; an empty queue behaves like a dead host.
#[derive(Default)]
pub struct ScriptedTransport {
  queue: Mutex<VecDeque<Scripted>>,
  calls: Mutex<Vec<RecordedCall>>,
  trip: Option<(usize, Arc<AtomicBool>)>,
  watched: Vec<PathBuf>,
  snapshots: Mutex<Vec<Vec<Option<String>>>>,
}

impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn status(self, status: u16) -> Self {
    self.push(Scripted::Reply(HttpReply {
      status,
      body: String::new(),
    }))
  }

  pub fn ok(self, body: &str) -> Self {
    self.push(Scripted::Reply(HttpReply {
      status: 200,
      body: body.to_string(),
    }))
  }

  pub fn fault(self) -> Self {
    self.push(Scripted::Fault)
  }

  /// Raise `flag` once `calls` requests have been served.
  pub fn trip_after(mut self, calls: usize, flag: Arc<AtomicBool>) -> Self {
    self.trip = Some((calls, flag));
    self
  }

  /// Read `path` as each request arrives, before it is served.
  pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
    self.watched.push(path.into());
    self
  }

  /// Contents of the watched files per request, `None` where a file was absent.
  pub fn snapshots(&self) -> Vec<Vec<Option<String>>> {
    self.snapshots.lock().unwrap().clone()
  }

  fn push(self, item: Scripted) -> Self {
    self.queue.lock().unwrap().push_back(item);
    self
  }

  pub fn calls(&self) -> Vec<RecordedCall> {
    self.calls.lock().unwrap().clone()
  }

  pub fn urls(&self) -> Vec<String> {
    self.calls().into_iter().map(|c| c.url).collect()
  }
}

impl Transport for ScriptedTransport {
  async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpReply> {
    let snapshot = self
      .watched
      .iter()
      .map(|path| std::fs::read_to_string(path).ok())
      .collect();
    self.snapshots.lock().unwrap().push(snapshot);

    let served = {
      let mut calls = self.calls.lock().unwrap();
      calls.push(RecordedCall {
        url: url.to_string(),
        user_agent: headers
          .get(USER_AGENT)
          .and_then(|v| v.to_str().ok())
          .map(String::from),
      });
      calls.len()
    };
    if let Some((after, flag)) = &self.trip {
      if served >= *after {
        flag.store(true, Ordering::SeqCst);
      }
    }

    match self.queue.lock().unwrap().pop_front() {
      Some(Scripted::Reply(reply)) => Ok(reply),
      Some(Scripted::Fault) => Err(eyre!("scripted connection reset")),
      None => Err(eyre!("no scripted reply for {}", url)),
    }
  }
}

/// Fixed one-second jitter; waits are recorded instead of slept.
#[derive(Default)]
pub struct RecordingPacer {
  waits: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
  pub fn waits(&self) -> Vec<Duration> {
    self.waits.lock().unwrap().clone()
  }
}

impl Pacer for RecordingPacer {
  fn jitter(&self) -> Duration {
    Duration::from_secs(1)
  }

  async fn pause(&self, wait: Duration) {
    self.waits.lock().unwrap().push(wait);
  }
}

pub type TestFetcher = Fetcher<ScriptedTransport, RecordingPacer>;

pub fn fetcher_with(transport: ScriptedTransport, max_retries: u32) -> TestFetcher {
  let agents = vec!["test-agent/1.0".to_string(), "test-agent/2.0".to_string()];
  Fetcher::new(
    transport,
    RecordingPacer::default(),
    HeaderRotation::new(&agents, "https://example.com/jobs/"),
    BackoffPolicy::new(max_retries, Duration::from_secs(30)),
  )
}

/// Scraper over `dir` (`cache/`, `raw/jobs_data.csv`) with one attempt per request.
pub fn scraper_with(
  transport: ScriptedTransport,
  dir: &Path,
  settings: CollectSettings,
) -> Scraper<ScriptedTransport, RecordingPacer> {
  let store = CacheStore::open(
    dir.join("cache/job_ids_cache.json"),
    dir.join("cache/job_data_cache.json"),
  );
  let checkpoint = CheckpointFile::new(dir.join("raw/jobs_data.csv"));
  let endpoints = Endpoints::new(&ScraperConfig::default()).unwrap();
  Scraper::new(fetcher_with(transport, 1), store, checkpoint, endpoints, settings)
}

/// Search results page with one card per id.
pub fn listing_page(ids: &[&str]) -> String {
  let cards: String = ids
    .iter()
    .map(|id| {
      format!(
        r#"<li><div class="base-card relative base-search-card" data-entity-urn="urn:li:jobPosting:{id}">
  <a class="base-card__full-link" href="https://example.com/jobs/view/{id}"></a>
</div></li>"#
      )
    })
    .collect();
  format!("<html><body><ul>{cards}</ul></body></html>")
}

/// Data rows of a CSV snapshot, header excluded.
pub fn csv_rows(text: Option<&str>) -> usize {
  text.map_or(0, |text| csv::Reader::from_reader(text.as_bytes()).records().count())
}

/// Entries of a JSON cache snapshot.
pub fn json_entries(text: Option<&str>) -> usize {
  text
    .and_then(|text| serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text).ok())
    .map_or(0, |entries| entries.len())
}

/// Guest detail page with the given title and criteria entries.
pub fn detail_page(title: &str, criteria: &[(&str, &str)]) -> String {
  let items: String = criteria
    .iter()
    .map(|(label, value)| {
      format!(
        r#"<li class="description__job-criteria-item">
  <h3 class="description__job-criteria-subheader">{label}</h3>
  <span class="description__job-criteria-text description__job-criteria-text--criteria">
    {value}
  </span>
</li>"#
      )
    })
    .collect();

  format!(
    r##"<html><body>
<section class="top-card-layout">
  <h2 class="top-card-layout__title font-sans">{title}</h2>
  <a class="topcard__org-name-link topcard__flavor--black-link" href="#">
    Acme Dados
  </a>
  <span class="topcard__flavor topcard__flavor--bullet">
    São Paulo, SP
  </span>
  <span class="posted-time-ago__text topcard__flavor--metadata">Há 2 semanas</span>
  <span class="num-applicants__caption topcard__flavor--metadata">Mais de 200 candidaturas</span>
</section>
<div class="show-more-less-html__markup">
  <strong>Requisitos:</strong><br>
  <ul><li>Python e SQL</li><li>Experiência com Airflow</li></ul>
</div>
<ul class="description__job-criteria-list">{items}</ul>
</body></html>"##
  )
}
