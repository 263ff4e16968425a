//! Cache entity names for scraped types.

use crate::cache::Cacheable;

use super::types::{JobIdEntry, JobRecord};

impl Cacheable for JobIdEntry {
  fn entity_type() -> &'static str {
    "job_id"
  }
}

impl Cacheable for JobRecord {
  fn entity_type() -> &'static str {
    "job_data"
  }
}
