//! Port interfaces for the dispatcher
//!
//! The dispatcher only knows how to run a per-record transformation and where
//! to hand the result; both are supplied through these traits.

use async_trait::async_trait;
use imds_tagger_domain::Metric;
use tokio::sync::mpsc;
use tracing::warn;

/// Per-record work applied by dispatcher workers.
///
/// Implementations must return exactly one record for every input.
#[async_trait]
pub trait RecordEnricher: Send + Sync + 'static {
    async fn enrich(&self, metric: Metric) -> Metric;
}

/// Downstream receiver of processed records.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Hand one processed record downstream.
    async fn emit(&self, metric: Metric);
}

#[async_trait]
impl MetricSink for mpsc::Sender<Metric> {
    async fn emit(&self, metric: Metric) {
        if let Err(err) = self.send(metric).await {
            warn!(metric = %err.0.name, "downstream receiver closed; record not delivered");
        }
    }
}
