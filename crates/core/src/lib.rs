//! # imds-tagger Core
//!
//! Enrichment logic of the stage - no HTTP or cache implementations.
//!
//! This crate contains:
//! - Port interfaces (traits) for the metadata source, the attribute cache
//!   and the downstream sink
//! - The enrichment service that tags one record
//! - The bounded, optionally order-preserving dispatcher
//! - The stage lifecycle tying them together
//!
//! ## Architecture Principles
//! - Only depends on `imds-tagger-domain`
//! - All external dependencies via traits
//! - No process-wide state: every stage owns its cache and client

pub mod dispatch;
pub mod enrichment;
pub mod stage;

// Infrastructure ports
pub mod processor_ports;

// Re-export specific items to avoid ambiguity
pub use dispatch::ports::{MetricSink, RecordEnricher};
pub use dispatch::{DispatchMode, Dispatcher, DispatcherConfig};
pub use enrichment::ports::{AttributeCache, InstanceMetadataProvider};
pub use enrichment::{EnrichmentMetrics, EnrichmentStats, MetadataEnricher};
pub use processor_ports::StreamingProcessor;
pub use stage::TaggerStage;
