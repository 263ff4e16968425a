//! HTML extraction for listing, detail and count pages.
//!
//! Every field lookup is "first element matching the selector, trimmed text,
//! or nothing". A markup change shows up as absent fields, never as an error.

use chrono::NaiveDateTime;
use color_eyre::{eyre::eyre, Result};
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{JobId, JobIdEntry, JobRecord, WorkModel};

/// Cards found on one search page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListingPage {
  /// All cards, including ones without a usable id
  pub card_count: usize,
  pub job_ids: Vec<JobId>,
}

/// Fields read from a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
  pub job_title: Option<String>,
  pub company_name: Option<String>,
  pub location: Option<String>,
  pub time_posted: Option<String>,
  pub num_applicants: Option<String>,
  /// Label -> value, in page order
  pub criteria: IndexMap<String, String>,
  pub job_description: Option<String>,
}

impl JobDetails {
  /// Criteria are taken by position: experience level is the 1st entry,
  /// employment type the 2nd and sector the 4th. The 3rd (job function) is
  /// not kept. Pages with fewer entries leave the later slots empty.
  pub fn into_record(self, job_id: &str, entry: &JobIdEntry, scrape_date: NaiveDateTime) -> JobRecord {
    let criterion = |position: usize| {
      self
        .criteria
        .get_index(position)
        .map(|(_, value)| value.clone())
    };

    JobRecord {
      xp_level: criterion(0),
      job_type: criterion(1),
      job_sectors: criterion(3),
      job_title: self.job_title,
      company_name: self.company_name,
      location: self.location,
      time_posted: self.time_posted,
      num_applicants: self.num_applicants,
      job_description: self.job_description,
      ..JobRecord::new(job_id, entry, scrape_date)
    }
  }
}

/// Compiled selectors for all page kinds.
pub struct PageParser {
  card: Selector,
  title: Selector,
  company: Selector,
  location: Selector,
  posted: Selector,
  applicants: Selector,
  criteria_item: Selector,
  criteria_label: Selector,
  criteria_value: Selector,
  description: Selector,
  filter_label: Selector,
}

fn selector(css: &str) -> Result<Selector> {
  Selector::parse(css).map_err(|e| eyre!("Invalid selector '{}': {}", css, e))
}

impl PageParser {
  pub fn new() -> Result<Self> {
    Ok(Self {
      card: selector("div.base-card")?,
      title: selector("h2.top-card-layout__title")?,
      company: selector("a.topcard__org-name-link")?,
      location: selector("span.topcard__flavor.topcard__flavor--bullet")?,
      posted: selector("span.posted-time-ago__text")?,
      applicants: selector("span.num-applicants__caption")?,
      criteria_item: selector("li.description__job-criteria-item")?,
      criteria_label: selector("h3.description__job-criteria-subheader")?,
      criteria_value: selector("span.description__job-criteria-text")?,
      description: selector("div.show-more-less-html__markup")?,
      filter_label: selector("div.filter-values-container__filter-value label")?,
    })
  }

  /// Ids are the last `:` segment of each card's `data-entity-urn`.
  pub fn listing(&self, html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for card in document.select(&self.card) {
      page.card_count += 1;
      let id = card
        .value()
        .attr("data-entity-urn")
        .and_then(|urn| urn.rsplit(':').next())
        .map(str::trim)
        .unwrap_or_default();
      if !id.is_empty() {
        page.job_ids.push(id.to_string());
      }
    }

    page
  }

  pub fn job_details(&self, html: &str) -> JobDetails {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut criteria = IndexMap::new();
    for item in root.select(&self.criteria_item) {
      let label = first_text(item, &self.criteria_label);
      let value = first_text(item, &self.criteria_value);
      match (label, value) {
        (Some(label), Some(value)) => {
          criteria.insert(label, value);
        }
        _ => debug!("Skipping incomplete criteria entry"),
      }
    }

    JobDetails {
      job_title: first_text(root, &self.title),
      company_name: first_text(root, &self.company),
      location: first_text(root, &self.location),
      time_posted: first_text(root, &self.posted),
      num_applicants: first_text(root, &self.applicants),
      criteria,
      job_description: root.select(&self.description).next().and_then(line_text),
    }
  }

  /// Totals shown next to the work-model filters, e.g. `"Remote (1,234)"`.
  pub fn work_model_counts(&self, html: &str) -> BTreeMap<WorkModel, u64> {
    let document = Html::parse_document(html);
    let mut counts = BTreeMap::new();

    for label in document.select(&self.filter_label) {
      let text: String = label.text().map(str::trim).collect();
      let Some(model) = filter_model(&text) else {
        continue;
      };
      match filter_count(&text) {
        Some(count) => {
          counts.insert(model, count);
        }
        None => debug!(label = %text, "Filter label without a count"),
      }
    }

    counts
  }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
  scope.select(selector).next().and_then(|element| {
    let text: String = element.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
  })
}

/// Text nodes trimmed, blanks dropped, one per line.
fn line_text(element: ElementRef<'_>) -> Option<String> {
  let lines: Vec<&str> = element
    .text()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .collect();
  (!lines.is_empty()).then(|| lines.join("\n"))
}

fn filter_model(label: &str) -> Option<WorkModel> {
  let label = label.to_lowercase();
  if label.contains("on-site") || label.contains("presencial") {
    Some(WorkModel::OnSite)
  } else if label.contains("remote") || label.contains("remoto") {
    Some(WorkModel::Remote)
  } else if label.contains("hybrid") || label.contains("híbrido") {
    Some(WorkModel::Hybrid)
  } else {
    None
  }
}

fn filter_count(label: &str) -> Option<u64> {
  let (_, tail) = label.rsplit_once('(')?;
  let (number, _) = tail.split_once(')')?;
  let digits: String = number.chars().filter(|c| !matches!(c, ',' | '.')).collect();
  digits.trim().parse().ok()
}
