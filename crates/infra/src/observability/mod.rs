//! Observability infrastructure
//!
//! Structured logging setup for hosts embedding the stage. Enrichment
//! counters live with the enricher in `imds-tagger-core`.

pub mod logging;

pub use logging::{init_logging, LogFormat};
