use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub scraper: ScraperConfig,
  #[serde(default)]
  pub taxonomy: TaxonomyConfig,
}

/// Where caches, checkpoints, processed tables and logs live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
  pub cache_dir: PathBuf,
  pub checkpoint: PathBuf,
  pub processed_dir: PathBuf,
  pub log_dir: PathBuf,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      cache_dir: PathBuf::from("data/cache"),
      checkpoint: PathBuf::from("data/raw/jobs_data.csv"),
      processed_dir: PathBuf::from("data/processed"),
      log_dir: PathBuf::from("logs"),
    }
  }
}

impl PathsConfig {
  pub fn job_ids_cache(&self) -> PathBuf {
    self.cache_dir.join("job_ids_cache.json")
  }

  pub fn job_data_cache(&self) -> PathBuf {
    self.cache_dir.join("job_data_cache.json")
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
  /// Scheme + host of the listings site, no trailing slash
  pub base_url: String,
  pub location: String,
  pub geo_id: String,
  /// Locale requested for detail pages (drives the relative-date wording)
  pub language: String,
  pub max_retries: u32,
  pub request_timeout_secs: u64,
  pub backoff_cap_secs: u64,
  pub checkpoint_batch_size: usize,
  pub cache_flush_every: usize,
  /// Return whatever was persisted when collection is interrupted
  pub partial_results_on_error: bool,
  pub keywords: Vec<String>,
  pub user_agents: Vec<String>,
}

impl Default for ScraperConfig {
  fn default() -> Self {
    Self {
      base_url: "https://www.linkedin.com".to_string(),
      location: "Brasil".to_string(),
      geo_id: "106057199".to_string(),
      language: "pt_BR".to_string(),
      max_retries: 5,
      request_timeout_secs: 10,
      backoff_cap_secs: 30,
      checkpoint_batch_size: 20,
      cache_flush_every: 10,
      partial_results_on_error: true,
      keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
      user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
    }
  }
}

/// Optional files replacing the built-in taxonomy tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
  pub skills: Option<PathBuf>,
  pub roles: Option<PathBuf>,
  pub gazetteer: Option<PathBuf>,
}

const DEFAULT_KEYWORDS: &[&str] = &[
  "Engenheiro de Dados",
  "Cientista de Dados",
  "Analista de Dados",
  "Analytics Engineer",
  "Machine Learning Engineer",
  "Data Engineer",
  "Data Scientist",
  "Data Analyst",
];

const DEFAULT_USER_AGENTS: &[&str] = &[
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
  "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
  "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
  "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
];

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jobscope.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jobscope/config.yaml
  ///
  /// Built-in defaults are used when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jobscope.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jobscope").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.scraper.max_retries == 0 {
      return Err(eyre!("scraper.max_retries must be at least 1"));
    }
    if config.scraper.user_agents.is_empty() {
      return Err(eyre!("scraper.user_agents must not be empty"));
    }
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml(
      r#"
scraper:
  max_retries: 3
paths:
  cache_dir: /tmp/jobs
"#,
    )
    .unwrap();

    assert_eq!(config.scraper.max_retries, 3);
    assert_eq!(config.scraper.checkpoint_batch_size, 20);
    assert_eq!(config.paths.cache_dir, PathBuf::from("/tmp/jobs"));
    assert_eq!(
      config.paths.job_ids_cache(),
      PathBuf::from("/tmp/jobs/job_ids_cache.json")
    );
    assert_eq!(config.paths.checkpoint, PathBuf::from("data/raw/jobs_data.csv"));
  }

  #[test]
  fn test_zero_retries_rejected() {
    assert!(Config::from_yaml("scraper:\n  max_retries: 0\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/jobscope.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
