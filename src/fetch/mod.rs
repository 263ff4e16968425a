//! HTTP fetching with header rotation and rate-limit backoff.
//!
//! The retry decision (`retry`) is a pure function of the attempt number and
//! the outcome; `client` drives it against a `Transport` and a `Pacer`, so the
//! whole loop runs in tests without network or real sleeps.

mod client;
mod headers;
mod retry;

pub use client::{Fetcher, Pacer, ReqwestTransport, SystemPacer, Transport};
pub use headers::HeaderRotation;

#[cfg(test)]
pub use client::HttpReply;
#[cfg(test)]
pub use retry::BackoffPolicy;
