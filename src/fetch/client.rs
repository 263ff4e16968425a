use color_eyre::{eyre::eyre, Result};
use rand::Rng;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::headers::HeaderRotation;
use super::retry::{AttemptOutcome, BackoffPolicy, RetryStep};

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
  pub status: u16,
  pub body: String,
}

/// Issues one GET. An `Err` means no HTTP status was obtained.
pub trait Transport {
  async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpReply>;
}

/// Source of backoff jitter and the sleep itself.
pub trait Pacer {
  fn jitter(&self) -> Duration;
  async fn pause(&self, wait: Duration);
}

/// Transport backed by a shared reqwest client with a fixed timeout.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;
    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpReply> {
    let response = self
      .client
      .get(url)
      .headers(headers)
      .send()
      .await
      .map_err(|e| eyre!("GET {} failed: {}", url, e))?;

    let status = response.status().as_u16();
    let body = response
      .text()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", url, e))?;

    Ok(HttpReply { status, body })
  }
}

/// Real sleeps with 1-3 s of uniform jitter.
pub struct SystemPacer;

impl Pacer for SystemPacer {
  fn jitter(&self) -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(1.0..3.0))
  }

  async fn pause(&self, wait: Duration) {
    tokio::time::sleep(wait).await;
  }
}

/// Retry-aware GET with header rotation.
///
/// Failure is reported as `None`; callers skip the unit of work.
pub struct Fetcher<T, P> {
  transport: T,
  pacer: P,
  headers: HeaderRotation,
  policy: BackoffPolicy,
}

impl<T: Transport, P: Pacer> Fetcher<T, P> {
  pub fn new(transport: T, pacer: P, headers: HeaderRotation, policy: BackoffPolicy) -> Self {
    Self {
      transport,
      pacer,
      headers,
      policy,
    }
  }

  #[cfg(test)]
  pub fn transport(&self) -> &T {
    &self.transport
  }

  #[cfg(test)]
  pub fn pacer(&self) -> &P {
    &self.pacer
  }

  /// Fetch `url` using the configured retry budget.
  pub async fn fetch(&self, url: &str) -> Option<HttpReply> {
    self.fetch_with_retries(url, self.policy.max_retries).await
  }

  pub async fn fetch_with_retries(&self, url: &str, max_retries: u32) -> Option<HttpReply> {
    let policy = BackoffPolicy {
      max_retries,
      ..self.policy
    };
    let mut previous_wait = Duration::ZERO;

    for attempt in 0..max_retries {
      debug!(%url, attempt = attempt + 1, max_retries, "Request attempt");
      if attempt > 0 {
        debug!(attempt = attempt + 1, "Rotated headers for retry");
      }

      let (outcome, reply) = match self.transport.get(url, self.headers.draw()).await {
        Ok(reply) => (AttemptOutcome::Status(reply.status), Some(reply)),
        Err(err) => {
          error!(%url, attempt = attempt + 1, error = %err, "Request failed");
          (AttemptOutcome::TransportFault, None)
        }
      };

      match policy.next_step(attempt, outcome, self.pacer.jitter(), previous_wait) {
        RetryStep::Succeeded => return reply,
        RetryStep::Backoff(wait) => {
          warn!(
            %url,
            attempt = attempt + 1,
            wait_secs = wait.as_secs_f64(),
            "Rate limited (429), waiting before retry"
          );
          previous_wait = wait;
          self.pacer.pause(wait).await;
        }
        RetryStep::Retry => {
          if let AttemptOutcome::Status(status) = outcome {
            warn!(%url, status, attempt = attempt + 1, "Unexpected status code");
          }
        }
        RetryStep::Exhausted => break,
      }
    }

    error!(%url, max_retries, "All retries failed");
    None
  }
}

impl Fetcher<ReqwestTransport, SystemPacer> {
  /// Production fetcher for the given retry budget and request timeout.
  pub fn system(
    headers: HeaderRotation,
    max_retries: u32,
    timeout: Duration,
    backoff_cap: Duration,
  ) -> Result<Self> {
    let transport = ReqwestTransport::new(timeout)?;
    info!(
      timeout_secs = timeout.as_secs(),
      max_retries, "HTTP fetcher ready"
    );
    Ok(Self::new(
      transport,
      SystemPacer,
      headers,
      BackoffPolicy::new(max_retries, backoff_cap),
    ))
  }
}
