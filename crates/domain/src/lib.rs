//! # imds-tagger Domain
//!
//! Domain types shared by every imds-tagger crate.
//!
//! This crate contains:
//! - The metric record flowing through the pipeline
//! - The instance metadata document and its field allow-list
//! - Stage configuration and its startup validation
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other imds-tagger crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
