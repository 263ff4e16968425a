//! Scraping of the public job-listings site.
//!
//! `discover` fills the id cache from paginated search results, `collect`
//! turns cached ids into full records and appends them to the checkpoint.

mod api;
mod cache;
mod collector;
mod discovery;
mod parse;
mod scraper;
pub mod types;

pub use scraper::{JobCounts, Scraper};
pub use types::{JobRecord, WorkModel, WorkModelSelector};

#[cfg(test)]
pub use api::Endpoints;
#[cfg(test)]
pub use scraper::CollectSettings;
