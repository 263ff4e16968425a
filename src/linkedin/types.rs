use chrono::NaiveDateTime;
use color_eyre::{eyre::eyre, Report};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque posting identifier, shared key of both caches.
pub type JobId = String;

/// Wire format of `scrape_date` in caches and tables.
pub const DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkModel {
  #[serde(rename = "On-site")]
  OnSite,
  Remote,
  Hybrid,
  #[serde(other)]
  Unknown,
}

impl WorkModel {
  pub const ALL: [WorkModel; 3] = [WorkModel::OnSite, WorkModel::Remote, WorkModel::Hybrid];

  /// Filter code used by the search endpoint (`f_WT`)
  pub fn code(self) -> Option<&'static str> {
    match self {
      WorkModel::OnSite => Some("1"),
      WorkModel::Remote => Some("2"),
      WorkModel::Hybrid => Some("3"),
      WorkModel::Unknown => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      WorkModel::OnSite => "On-site",
      WorkModel::Remote => "Remote",
      WorkModel::Hybrid => "Hybrid",
      WorkModel::Unknown => "Unknown",
    }
  }
}

impl fmt::Display for WorkModel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Work-model filter applied per discovery page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkModelSelector {
  Fixed(WorkModel),
  /// Draw one of the three models for every page
  Random,
}

impl FromStr for WorkModelSelector {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "1" => Ok(Self::Fixed(WorkModel::OnSite)),
      "2" => Ok(Self::Fixed(WorkModel::Remote)),
      "3" => Ok(Self::Fixed(WorkModel::Hybrid)),
      "random" => Ok(Self::Random),
      other => Err(eyre!(
        "Invalid work model '{}': choose 1 (On-site), 2 (Remote), 3 (Hybrid) or random",
        other
      )),
    }
  }
}

/// How an id was discovered. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIdEntry {
  pub work_model: WorkModel,
  pub keyword: String,
}

/// One scraped posting. Field order is the checkpoint column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
  pub job_id: JobId,
  pub work_model: WorkModel,
  pub keyword: String,
  #[serde(with = "scrape_date_format")]
  pub scrape_date: NaiveDateTime,
  pub job_title: Option<String>,
  pub company_name: Option<String>,
  pub location: Option<String>,
  pub time_posted: Option<String>,
  pub num_applicants: Option<String>,
  pub xp_level: Option<String>,
  pub job_type: Option<String>,
  pub job_sectors: Option<String>,
  pub job_description: Option<String>,
}

impl JobRecord {
  /// Record shell carrying provenance only; page fields start absent.
  pub fn new(job_id: &str, entry: &JobIdEntry, scrape_date: NaiveDateTime) -> Self {
    Self {
      job_id: job_id.to_string(),
      work_model: entry.work_model,
      keyword: entry.keyword.clone(),
      scrape_date,
      job_title: None,
      company_name: None,
      location: None,
      time_posted: None,
      num_applicants: None,
      xp_level: None,
      job_type: None,
      job_sectors: None,
      job_description: None,
    }
  }
}

pub mod scrape_date_format {
  use super::DATE_FORMAT;
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
  }

  /// Absent dates become empty cells.
  pub fn serialize_optional<S: Serializer>(
    date: &Option<NaiveDateTime>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match date {
      Some(date) => serialize(date, serializer),
      None => serializer.serialize_none(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selector_parsing() {
    assert_eq!(
      "2".parse::<WorkModelSelector>().unwrap(),
      WorkModelSelector::Fixed(WorkModel::Remote)
    );
    assert_eq!(
      "Random".parse::<WorkModelSelector>().unwrap(),
      WorkModelSelector::Random
    );
    assert!("4".parse::<WorkModelSelector>().is_err());
    assert!("remote".parse::<WorkModelSelector>().is_err());
  }

  #[test]
  fn test_work_model_labels_round_trip_through_json() {
    let json = serde_json::to_string(&WorkModel::OnSite).unwrap();
    assert_eq!(json, "\"On-site\"");
    let parsed: WorkModel = serde_json::from_str("\"Hybrid\"").unwrap();
    assert_eq!(parsed, WorkModel::Hybrid);
    let unknown: WorkModel = serde_json::from_str("\"Presencial\"").unwrap();
    assert_eq!(unknown, WorkModel::Unknown);
  }

  #[test]
  fn test_codes() {
    let codes: Vec<_> = WorkModel::ALL.iter().map(|m| m.code().unwrap()).collect();
    assert_eq!(codes, vec!["1", "2", "3"]);
    assert_eq!(WorkModel::Unknown.code(), None);
  }
}
