use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use super::parse::PageParser;
use super::scraper::{JobCounts, Scraper};
use super::types::{JobIdEntry, WorkModel, WorkModelSelector};
use crate::cache::CacheKind;
use crate::fetch::{Pacer, Transport};

/// Cards per search page.
pub const PAGE_SIZE: usize = 10;

impl<T: Transport, P: Pacer> Scraper<T, P> {
  /// Page through search results for `keyword`, registering unseen ids.
  ///
  /// Stops at `target` new ids, at the first page without cards, or when the
  /// offsets run out. The id cache is saved after every page that added ids
  /// and once more on the way out. Returns the number of new ids.
  pub async fn discover(&mut self, target: usize, keyword: &str, selector: WorkModelSelector) -> usize {
    info!(target, %keyword, ?selector, "Discovering job ids");

    let added = match PageParser::new() {
      Ok(parser) => self.discover_pages(&parser, target, keyword, selector).await,
      Err(err) => {
        error!(%keyword, error = %err, "Unexpected error during discovery");
        0
      }
    };

    self.store.save(CacheKind::JobIds);
    info!(
      %keyword,
      added,
      total = self.store.ids().len(),
      "Finished discovery"
    );
    added
  }

  async fn discover_pages(
    &mut self,
    parser: &PageParser,
    target: usize,
    keyword: &str,
    selector: WorkModelSelector,
  ) -> usize {
    let mut added = 0;

    for start in (0..target).step_by(PAGE_SIZE) {
      if self.interrupted() {
        warn!(start, %keyword, "Discovery interrupted");
        break;
      }
      if added >= target {
        info!(target, "Target of new ids reached");
        break;
      }

      let model = match selector {
        WorkModelSelector::Fixed(model) => model,
        WorkModelSelector::Random => *WorkModel::ALL
          .choose(&mut rand::thread_rng())
          .unwrap_or(&WorkModel::OnSite),
      };
      let url = self.endpoints.search_page(keyword, model, start);
      debug!(%url, "Fetching job id page");

      let Some(reply) = self.fetcher.fetch(&url).await else {
        warn!(start, %keyword, "Failed to fetch job id page, skipping");
        continue;
      };

      let page = parser.listing(&reply.body);
      if page.card_count == 0 {
        info!(start, %keyword, "No job cards on page, end of results");
        break;
      }

      let mut page_added = 0;
      for job_id in page.job_ids {
        let entry = JobIdEntry {
          work_model: model,
          keyword: keyword.to_string(),
        };
        if self.store.add_id(&job_id, entry) {
          page_added += 1;
        }
      }
      added += page_added;
      info!(start, new_ids = page_added, "Processed job id page");

      if page_added > 0 {
        self.store.save(CacheKind::JobIds);
      }
    }

    added
  }

  /// Discover every keyword and work model with a positive count, asking for
  /// as many ids as the count announced. Stops between units once interrupted.
  pub async fn discover_counted(&mut self, counts: &JobCounts) -> usize {
    let mut added = 0;
    for (keyword, per_model) in counts {
      for (&model, &count) in per_model {
        if count == 0 {
          continue;
        }
        if self.interrupted() {
          warn!(%keyword, %model, "Interrupted, skipping remaining discoveries");
          return added;
        }
        let target = usize::try_from(count).unwrap_or(usize::MAX);
        added += self
          .discover(target, keyword, WorkModelSelector::Fixed(model))
          .await;
      }
    }
    added
  }
}
