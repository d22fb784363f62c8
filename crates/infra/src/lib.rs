//! # imds-tagger Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The HTTP client for the instance metadata service
//! - The moka-backed attribute cache
//! - Configuration loading from environment and files
//! - Logging setup
//!
//! ## Architecture
//! - Implements traits defined in `imds-tagger-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use bootstrap::build_stage;
pub use cache::MokaAttributeCache;
pub use errors::InfraError;
pub use http::{ImdsClient, ImdsClientBuilder};
pub use observability::{init_logging, LogFormat};
