//! Capability interface consumed by the pipeline that embeds a stage.

use std::sync::Arc;

use async_trait::async_trait;
use imds_tagger_domain::{Metric, Result};

use crate::dispatch::ports::MetricSink;

/// A streaming processor: started once with its downstream sink, fed one
/// record at a time, and stopped once.
#[async_trait]
pub trait StreamingProcessor: Send + Sync {
    /// Begin accepting records; every output is emitted to `sink`.
    async fn start(&mut self, sink: Arc<dyn MetricSink>) -> Result<()>;

    /// Submit one record. May wait while internal queues are full.
    async fn process(&self, metric: Metric) -> Result<()>;

    /// Stop accepting records and flush everything in flight.
    async fn stop(&mut self) -> Result<()>;
}
