//! Per-record metadata enrichment

pub mod metrics;
pub mod ports;
pub mod service;

pub use metrics::{EnrichmentMetrics, EnrichmentStats};
pub use ports::*;
pub use service::*;
