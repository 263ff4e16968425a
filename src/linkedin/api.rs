//! Guest endpoints of the listings site.

use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::types::WorkModel;
use crate::config::ScraperConfig;

const SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";
const POSTING_PATH: &str = "/jobs-guest/jobs/api/jobPosting";
const COUNT_PATH: &str = "/jobs/search";
const REFERER_PATH: &str = "/jobs/";

/// URL builders bound to one site, location and locale.
#[derive(Debug, Clone)]
pub struct Endpoints {
  search: Url,
  posting: Url,
  count: Url,
  referer: Url,
  location: String,
  geo_id: String,
  language: String,
}

impl Endpoints {
  pub fn new(config: &ScraperConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid base_url '{}': {}", config.base_url, e))?;
    let join = |path: &str| {
      base
        .join(path)
        .map_err(|e| eyre!("Failed to build endpoint {}: {}", path, e))
    };

    Ok(Self {
      search: join(SEARCH_PATH)?,
      posting: join(POSTING_PATH)?,
      count: join(COUNT_PATH)?,
      referer: join(REFERER_PATH)?,
      location: config.location.clone(),
      geo_id: config.geo_id.clone(),
      language: config.language.clone(),
    })
  }

  /// One page of search results, `start` cards into the listing.
  pub fn search_page(&self, keyword: &str, model: WorkModel, start: usize) -> String {
    let mut url = self.search.clone();
    {
      let mut query = url.query_pairs_mut();
      query
        .append_pair("keywords", &quoted(keyword))
        .append_pair("location", &self.location)
        .append_pair("geoId", &self.geo_id);
      if let Some(code) = model.code() {
        query.append_pair("f_WT", code);
      }
      query.append_pair("start", &start.to_string());
    }
    url.into()
  }

  pub fn job_posting(&self, job_id: &str) -> String {
    let mut url = self.posting.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.push(job_id);
    }
    url.query_pairs_mut().append_pair("_l", &self.language);
    url.into()
  }

  /// Public search page whose filter labels carry per-model totals.
  pub fn search_counts(&self, keyword: &str) -> String {
    let mut url = self.count.clone();
    url
      .query_pairs_mut()
      .append_pair("keywords", &quoted(keyword))
      .append_pair("location", &self.location)
      .append_pair("geoId", &self.geo_id);
    url.into()
  }

  pub fn referer(&self) -> &str {
    self.referer.as_str()
  }
}

/// Exact-phrase search
fn quoted(keyword: &str) -> String {
  format!("\"{}\"", keyword)
}
