use color_eyre::{eyre::eyre, Report};
use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::str::FromStr;
use tracing::{info, warn};

use super::taxonomy::{SkillTaxonomy, SkillTerm};
use super::text::normalize;
use crate::linkedin::JobRecord;

/// Record field scanned for skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
  JobDescription,
  JobTitle,
  JobSectors,
}

impl TextField {
  fn read(self, record: &JobRecord) -> Option<&str> {
    match self {
      TextField::JobDescription => record.job_description.as_deref(),
      TextField::JobTitle => record.job_title.as_deref(),
      TextField::JobSectors => record.job_sectors.as_deref(),
    }
  }
}

impl FromStr for TextField {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "job_description" => Ok(TextField::JobDescription),
      "job_title" => Ok(TextField::JobTitle),
      "job_sectors" => Ok(TextField::JobSectors),
      other => Err(eyre!(
        "Unknown text field '{}': expected job_description, job_title or job_sectors",
        other
      )),
    }
  }
}

/// One row of the job -> skill relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillRow {
  pub job_id: String,
  pub skill: String,
}

struct CompiledSkill {
  name: String,
  patterns: Vec<Regex>,
}

pub struct SkillExtractor {
  skills: Vec<CompiledSkill>,
}

impl SkillExtractor {
  /// Compile every term. Bad terms are dropped; a skill left without terms
  /// is dropped as well.
  pub fn new(taxonomy: &SkillTaxonomy) -> Self {
    let mut skills = Vec::with_capacity(taxonomy.skills.len());

    for (name, terms) in &taxonomy.skills {
      let patterns: Vec<Regex> = terms
        .iter()
        .filter_map(|term| match compile_term(term) {
          Ok(regex) => Some(regex),
          Err(err) => {
            warn!(skill = %name, ?term, error = %err, "Invalid skill pattern, skipping");
            None
          }
        })
        .collect();

      if patterns.is_empty() {
        warn!(skill = %name, "No valid patterns for skill");
        continue;
      }
      skills.push(CompiledSkill {
        name: name.clone(),
        patterns,
      });
    }

    if skills.is_empty() {
      warn!("No skill patterns prepared, extraction will find nothing");
    } else {
      info!(skills = skills.len(), "Prepared skill patterns");
    }
    Self { skills }
  }

  /// Canonical names of every skill mentioned in `text`, in taxonomy order.
  pub fn extract_skills(&self, text: Option<&str>) -> IndexSet<&str> {
    let normalized = normalize(text.unwrap_or_default());
    if normalized.is_empty() {
      return IndexSet::new();
    }

    self
      .skills
      .iter()
      .filter(|skill| skill.patterns.iter().any(|p| p.is_match(&normalized)))
      .map(|skill| skill.name.as_str())
      .collect()
  }

  /// Extract skills from `field` of every record.
  ///
  /// Records come back untouched alongside one `(job_id, skill)` row per
  /// matched skill.
  pub fn process_collection(
    &self,
    records: Vec<JobRecord>,
    field: TextField,
  ) -> (Vec<JobRecord>, Vec<SkillRow>) {
    info!(records = records.len(), ?field, "Starting skill extraction");

    let mut rows = Vec::new();
    for record in &records {
      for skill in self.extract_skills(field.read(record)) {
        rows.push(SkillRow {
          job_id: record.job_id.clone(),
          skill: skill.to_string(),
        });
      }
    }

    info!(entries = rows.len(), "Skill extraction completed");
    (records, rows)
  }
}

fn compile_term(term: &SkillTerm) -> Result<Regex, regex::Error> {
  let pattern = match term {
    SkillTerm::Literal(literal) => {
      format!(r"(?:^|\W){}(?:$|\W)", regex::escape(&normalize(literal)))
    }
    SkillTerm::Regex { regex } => regex.clone(),
  };
  RegexBuilder::new(&pattern).case_insensitive(true).build()
}
