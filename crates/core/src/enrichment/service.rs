//! Metadata enrichment service - tags one record with instance attributes

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use imds_tagger_domain::{FieldSet, InstanceDocument, InstanceField, Metric, Result, TaggerError};
use tracing::{debug, error, trace};

use super::metrics::EnrichmentMetrics;
use super::ports::{AttributeCache, InstanceMetadataProvider};
use crate::dispatch::ports::RecordEnricher;

/// Tags records with the configured instance attributes.
///
/// Fields are served from the cache when possible. Any miss triggers a
/// single fetch whose document supplies every missed field, and the cache is
/// refilled from it. A failed fetch leaves the record exactly as received.
pub struct MetadataEnricher {
    fields: FieldSet,
    provider: Arc<dyn InstanceMetadataProvider>,
    cache: Arc<dyn AttributeCache>,
    timeout: Duration,
    metrics: Arc<EnrichmentMetrics>,
}

impl MetadataEnricher {
    /// Create a new enricher
    pub fn new(
        fields: FieldSet,
        provider: Arc<dyn InstanceMetadataProvider>,
        cache: Arc<dyn AttributeCache>,
        timeout: Duration,
    ) -> Self {
        Self { fields, provider, cache, timeout, metrics: Arc::new(EnrichmentMetrics::new()) }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn metrics(&self) -> Arc<EnrichmentMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Tag `metric`, always returning it.
    ///
    /// Lookup failures are logged and counted; the record is then returned
    /// without any added tag.
    pub async fn enrich(&self, mut metric: Metric) -> Metric {
        match self.lookup().await {
            Ok(tags) => {
                for (field, value) in tags {
                    metric.add_tag(field.as_str(), value);
                }
                metric
            }
            Err(err) => {
                self.metrics.record_passthrough();
                error!(
                    metric = %metric.name,
                    kind = err.label(),
                    error = %err,
                    "Error when fetching instance metadata; passing record through untagged"
                );
                metric
            }
        }
    }

    /// Resolve every configured field to the value that should be tagged.
    ///
    /// Fields whose value is empty are omitted.
    ///
    /// # Errors
    /// Propagates the fetch error when a field missed the cache and the
    /// metadata request failed or timed out.
    pub async fn lookup(&self) -> Result<Vec<(InstanceField, String)>> {
        let mut tags = Vec::with_capacity(self.fields.len());
        let mut missing = Vec::new();

        for field in self.fields.iter() {
            match self.cache.get(field) {
                Some(value) => {
                    trace!(field = %field, "attribute cache hit");
                    self.metrics.record_hit();
                    if !value.is_empty() {
                        tags.push((field, value));
                    }
                }
                None => {
                    trace!(field = %field, "attribute cache miss");
                    self.metrics.record_miss();
                    missing.push(field);
                }
            }
        }

        if missing.is_empty() {
            return Ok(tags);
        }

        // Concurrent lookups that miss together each fetch; nothing coalesces
        // them. The bound is one fetch per lookup.
        let document = self.fetch().await?;
        for field in missing {
            let value = document.get(field);
            // Empty values are cached too so an attribute the endpoint never
            // reports does not cost a request per record.
            self.cache.set(field, value.to_string());
            if !value.is_empty() {
                tags.push((field, value.to_string()));
            }
        }

        Ok(tags)
    }

    async fn fetch(&self) -> Result<InstanceDocument> {
        self.metrics.record_fetch();
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.provider.fetch(self.timeout)).await {
            Ok(Ok(document)) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "fetched instance metadata"
                );
                Ok(document)
            }
            Ok(Err(err)) => {
                self.metrics.record_fetch_error();
                Err(err)
            }
            Err(_) => {
                self.metrics.record_fetch_timeout();
                Err(TaggerError::Transport(format!(
                    "metadata request timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl RecordEnricher for MetadataEnricher {
    async fn enrich(&self, metric: Metric) -> Metric {
        MetadataEnricher::enrich(self, metric).await
    }
}
