//! Cache of rendered documents
//!
//! [`DocumentCache`] maps document identifiers to rendered HTML with a fetch
//! timestamp and refetches once an entry is older than the TTL. Time comes from
//! an injected [`Clock`] and documents from an injected source. Entries can be
//! mirrored to disk through a [`DiskStore`].

mod clock;
mod manager;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheConfig, DocumentCache};
pub use store::{DiskStore, StoreError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Rendered HTML and when it was fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry may still be served at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}
