//! Port interfaces for metadata enrichment
//!
//! These traits define the boundaries between the enrichment logic and the
//! infrastructure that talks to the metadata endpoint or stores attributes.

use std::time::Duration;

use async_trait::async_trait;
use imds_tagger_domain::{InstanceDocument, InstanceField, Result};

/// Source of instance metadata documents.
///
/// Implementations issue exactly one request per call and never retry.
/// They must be safe to call concurrently from every worker.
#[async_trait]
pub trait InstanceMetadataProvider: Send + Sync {
    /// Fetch a fresh document, giving up after `timeout`.
    ///
    /// # Errors
    /// `TaggerError::Transport` for connection failures, timeouts and error
    /// statuses; `TaggerError::Decode` for malformed documents.
    async fn fetch(&self, timeout: Duration) -> Result<InstanceDocument>;
}

/// Time-bounded store of the last observed value per field.
///
/// Entries past their TTL must read as absent even before they are purged.
pub trait AttributeCache: Send + Sync {
    /// Cached value of `field`, if present and not expired.
    fn get(&self, field: InstanceField) -> Option<String>;

    /// Store `value` for `field`, restarting its TTL.
    fn set(&self, field: InstanceField, value: String);

    /// Physically remove expired entries.
    fn purge_expired(&self);

    /// Number of entries currently held. May count expired entries that
    /// have not been purged yet.
    fn entry_count(&self) -> u64;
}
