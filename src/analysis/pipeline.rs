use chrono::NaiveDateTime;
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use super::location::LocationNormalizer;
use super::posted::{applicant_count, post_date};
use super::skills::{SkillExtractor, SkillRow, TextField};
use super::taxonomy::Taxonomy;
use super::titles::TitleClassifier;
use crate::cache::CheckpointFile;
use crate::config::Config;
use crate::linkedin::types::scrape_date_format;
use crate::linkedin::{JobRecord, WorkModel};

pub const JOBS_TABLE: &str = "df_jobs_classified.csv";
pub const SKILLS_TABLE: &str = "df_skills.csv";

/// One posting after classification and enrichment.
///
/// The raw `location` and `time_posted` are replaced by the parsed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedJob {
  pub job_id: String,
  pub work_model: WorkModel,
  pub keyword: String,
  #[serde(serialize_with = "scrape_date_format::serialize")]
  pub scrape_date: NaiveDateTime,
  pub job_title: String,
  pub company_name: Option<String>,
  pub num_applicants: Option<u64>,
  pub xp_level: Option<String>,
  pub job_type: Option<String>,
  pub job_sectors: Option<String>,
  pub job_description: Option<String>,
  pub classified_job_title: String,
  #[serde(serialize_with = "scrape_date_format::serialize_optional")]
  pub post_date: Option<NaiveDateTime>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub country: String,
}

#[derive(Debug, Default)]
pub struct Analysis {
  pub jobs: Vec<ClassifiedJob>,
  pub skills: Vec<SkillRow>,
  /// Repeated postings removed before extraction
  pub duplicates: usize,
  /// Postings dropped for lacking a title
  pub untitled: usize,
}

/// Skill extraction, title classification and field parsing in one pass.
pub struct Analyzer {
  skills: SkillExtractor,
  titles: TitleClassifier,
  locations: LocationNormalizer,
}

impl Analyzer {
  pub fn new(taxonomy: &Taxonomy) -> Result<Self> {
    Ok(Self {
      skills: SkillExtractor::new(&taxonomy.skills),
      titles: TitleClassifier::new(&taxonomy.roles),
      locations: LocationNormalizer::new(&taxonomy.gazetteer)?,
    })
  }

  pub fn analyze(&self, records: Vec<JobRecord>, field: TextField) -> Analysis {
    let total = records.len();
    let unique = drop_repeated_postings(records);
    let duplicates = total - unique.len();

    let (records, skills) = self
      .skills
      .process_collection(unique, field);
    info!(postings = records.len(), "Extracted skills");

    let before = records.len();
    let jobs: Vec<ClassifiedJob> = records
      .into_iter()
      .filter_map(|record| self.enrich(record))
      .collect();
    info!(classified = jobs.len(), "Classified job titles");

    Analysis {
      untitled: before - jobs.len(),
      jobs,
      skills,
      duplicates,
    }
  }

  fn enrich(&self, record: JobRecord) -> Option<ClassifiedJob> {
    let job_title = record.job_title?;
    let classified_job_title = self.titles.classify(Some(job_title.as_str())).to_string();
    let location = self.locations.normalize(record.location.as_deref());

    Some(ClassifiedJob {
      num_applicants: applicant_count(record.num_applicants.as_deref()),
      post_date: post_date(record.time_posted.as_deref(), record.scrape_date),
      job_id: record.job_id,
      work_model: record.work_model,
      keyword: record.keyword,
      scrape_date: record.scrape_date,
      job_title,
      company_name: record.company_name,
      xp_level: record.xp_level,
      job_type: record.job_type,
      job_sectors: record.job_sectors,
      job_description: record.job_description,
      classified_job_title,
      city: location.city,
      state: location.state,
      country: location.country,
    })
  }
}

/// The same posting is often listed under several ids; keep the first.
fn drop_repeated_postings(records: Vec<JobRecord>) -> Vec<JobRecord> {
  let mut seen = HashSet::new();
  records
    .into_iter()
    .filter(|r| {
      seen.insert((
        r.work_model,
        r.job_title.clone(),
        r.company_name.clone(),
        r.xp_level.clone(),
        r.job_type.clone(),
        r.job_sectors.clone(),
        r.job_description.clone(),
      ))
    })
    .collect()
}

/// Read the checkpoint, analyze it and write both processed tables.
pub fn run(config: &Config, field: TextField) -> Result<Analysis> {
  let checkpoint = CheckpointFile::new(&config.paths.checkpoint);
  if !checkpoint.exists() {
    return Err(eyre!(
      "No collected jobs at {}, run collect first",
      checkpoint.path().display()
    ));
  }

  let records = checkpoint.read_records()?;
  info!(postings = records.len(), path = %checkpoint.path().display(), "Starting analysis");

  let taxonomy = Taxonomy::load(&config.taxonomy)?;
  let analysis = Analyzer::new(&taxonomy)?.analyze(records, field);

  let jobs_path = config.paths.processed_dir.join(JOBS_TABLE);
  let skills_path = config.paths.processed_dir.join(SKILLS_TABLE);
  write_table(&jobs_path, &analysis.jobs)?;
  write_table(&skills_path, &analysis.skills)?;

  info!(
    jobs = analysis.jobs.len(),
    skills = analysis.skills.len(),
    duplicates = analysis.duplicates,
    untitled = analysis.untitled,
    "Exported processed tables"
  );
  Ok(analysis)
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
  }
  let mut writer =
    csv::Writer::from_path(path).map_err(|e| eyre!("Failed to create {}: {}", path.display(), e))?;
  for row in rows {
    writer
      .serialize(row)
      .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
  }
  writer.flush()?;
  info!(rows = rows.len(), path = %path.display(), "Saved table");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::linkedin::types::JobIdEntry;
  use chrono::NaiveDate;

  fn record(id: &str, title: Option<&str>, description: &str) -> JobRecord {
    let entry = JobIdEntry {
      work_model: WorkModel::Hybrid,
      keyword: "Engenheiro de Dados".to_string(),
    };
    let date = NaiveDate::from_ymd_opt(2024, 5, 10)
      .unwrap()
      .and_hms_opt(10, 0, 0)
      .unwrap();
    let mut record = JobRecord::new(id, &entry, date);
    record.job_title = title.map(str::to_string);
    record.company_name = Some("Acme".to_string());
    record.location = Some("Campinas, SP".to_string());
    record.time_posted = Some("Há 2 dias".to_string());
    record.num_applicants = Some("Mais de 100 candidaturas".to_string());
    record.job_description = Some(description.to_string());
    record
  }

  #[test]
  fn test_analyze_enriches_and_filters() {
    let analyzer = Analyzer::new(&Taxonomy::builtin()).unwrap();
    let records = vec![
      record("1", Some("Engenheiro de Dados Sênior"), "Python, Spark e Airflow"),
      record("2", Some("Engenheiro de Dados Sênior"), "Python, Spark e Airflow"),
      record("3", None, "SQL"),
      record("4", Some("Analista de Dados"), "Excel e Power BI"),
    ];

    let analysis = analyzer.analyze(records, TextField::JobDescription);

    assert_eq!(analysis.duplicates, 1);
    assert_eq!(analysis.untitled, 1);
    let ids: Vec<_> = analysis.jobs.iter().map(|j| j.job_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "4"]);

    let first = &analysis.jobs[0];
    assert_eq!(first.classified_job_title, "Engenheiro de Dados");
    assert_eq!(first.num_applicants, Some(100));
    assert_eq!(first.city.as_deref(), Some("Campinas"));
    assert_eq!(first.state.as_deref(), Some("SP"));
    assert_eq!(
      first.post_date,
      NaiveDate::from_ymd_opt(2024, 5, 8).unwrap().and_hms_opt(10, 0, 0)
    );

    // the untitled posting still contributes skills
    assert!(analysis
      .skills
      .iter()
      .any(|row| row.job_id == "3" && row.skill == "SQL"));
    assert!(!analysis.skills.iter().any(|row| row.job_id == "2"));
  }

  #[test]
  fn test_run_writes_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.paths.checkpoint = dir.path().join("raw/jobs_data.csv");
    config.paths.processed_dir = dir.path().join("processed");

    assert!(run(&config, TextField::JobDescription).is_err());

    CheckpointFile::new(&config.paths.checkpoint)
      .append(&[record("7", Some("Data Scientist"), "Python e Machine Learning")]);
    let analysis = run(&config, TextField::JobDescription).unwrap();
    assert_eq!(analysis.jobs.len(), 1);

    let jobs = std::fs::read_to_string(dir.path().join("processed").join(JOBS_TABLE)).unwrap();
    let header = jobs.lines().next().unwrap();
    assert_eq!(
      header,
      "job_id,work_model,keyword,scrape_date,job_title,company_name,num_applicants,\
       xp_level,job_type,job_sectors,job_description,classified_job_title,post_date,\
       city,state,country"
    );
    assert!(jobs.contains("Cientista de Dados"));
    assert!(jobs.contains("08-05-2024 10:00:00"));

    let skills = std::fs::read_to_string(dir.path().join("processed").join(SKILLS_TABLE)).unwrap();
    assert!(skills.starts_with("job_id,skill"));
    assert!(skills.contains("7,Machine Learning"));
    assert!(skills.contains("7,Python"));
  }
}
