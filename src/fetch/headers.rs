use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::warn;

/// Browser-like headers sent with every request besides the user agent.
const BROWSER_HEADERS: &[(&str, &str)] = &[
  (
    "accept",
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
  ),
  ("accept-language", "en-US,en;q=0.5"),
  ("dnt", "1"),
  ("upgrade-insecure-requests", "1"),
  ("sec-fetch-dest", "document"),
  ("sec-fetch-mode", "navigate"),
  ("sec-fetch-site", "none"),
  ("sec-fetch-user", "?1"),
  ("cache-control", "max-age=0"),
];

/// Pool of user agents rotated across attempts.
#[derive(Debug, Clone)]
pub struct HeaderRotation {
  user_agents: Vec<HeaderValue>,
  referer: Option<HeaderValue>,
}

impl HeaderRotation {
  /// Agents that are not valid header values are skipped.
  pub fn new(user_agents: &[String], referer: &str) -> Self {
    let user_agents = user_agents
      .iter()
      .filter_map(|ua| match HeaderValue::from_str(ua) {
        Ok(value) => Some(value),
        Err(_) => {
          warn!(user_agent = %ua, "Skipping invalid user agent");
          None
        }
      })
      .collect();

    Self {
      user_agents,
      referer: HeaderValue::from_str(referer).ok(),
    }
  }

  /// A fresh header set with a randomly drawn user agent.
  pub fn draw(&self) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in BROWSER_HEADERS {
      headers.insert(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
      );
    }
    if let Some(referer) = &self.referer {
      headers.insert(reqwest::header::REFERER, referer.clone());
    }
    if let Some(ua) = self.user_agents.choose(&mut rand::thread_rng()) {
      headers.insert(USER_AGENT, ua.clone());
    }
    headers
  }
}
