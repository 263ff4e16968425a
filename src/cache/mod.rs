//! On-disk persistence for scraped postings.
//!
//! - Two keyed caches (discovered ids, full records), each one JSON blob
//! - An append-only checkpoint table written in batches
//!
//! Loading never fails: a missing or unreadable blob yields an empty cache.
//! Saving replaces the blob atomically and reports failure through logs, so
//! a crash at any point leaves the previous persisted state intact.

mod checkpoint;
mod storage;
mod store;
mod traits;

pub use checkpoint::CheckpointFile;
pub use store::{CacheKind, CacheStore};
pub use traits::Cacheable;
