//! Attribute cache with TTL.
//!
//! Holds the last value fetched for each instance metadata field so records
//! arriving within the TTL are tagged without a network round trip.
//!
//! # Cache Strategy
//! - **Key**: the metadata field
//! - **Value**: the value last fetched for it, possibly empty
//! - **TTL**: 5 minutes from insertion (configurable)
//! - **Eviction**: time-to-live based, plus the stage's periodic purge
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//!
//! use imds_tagger_core::AttributeCache;
//! use imds_tagger_domain::InstanceField;
//! use imds_tagger_infra::cache::MokaAttributeCache;
//!
//! let cache = MokaAttributeCache::new(Duration::from_secs(300));
//! cache.set(InstanceField::Location, "eastus".to_string());
//! assert_eq!(cache.get(InstanceField::Location).as_deref(), Some("eastus"));
//! ```

use std::time::Duration;

use imds_tagger_core::AttributeCache;
use imds_tagger_domain::constants::CACHE_TTL;
use imds_tagger_domain::InstanceField;
use moka::sync::Cache;

/// Thread-safe attribute cache with TTL-based eviction.
///
/// Clones share the same underlying storage.
#[derive(Clone)]
pub struct MokaAttributeCache {
    cache: Cache<InstanceField, String>,
}

impl MokaAttributeCache {
    /// Create a new cache whose entries live for `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(64) // one entry per metadata field
                .build(),
        }
    }

    /// Create a new cache with the default TTL (5 minutes).
    #[must_use]
    pub fn default_ttl() -> Self {
        Self::new(CACHE_TTL)
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for MokaAttributeCache {
    fn default() -> Self {
        Self::default_ttl()
    }
}

impl AttributeCache for MokaAttributeCache {
    fn get(&self, field: InstanceField) -> Option<String> {
        self.cache.get(&field)
    }

    fn set(&self, field: InstanceField, value: String) {
        self.cache.insert(field, value);
    }

    fn purge_expired(&self) {
        self.cache.run_pending_tasks();
    }

    /// Note: this triggers eviction of expired entries.
    fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
