//! # imds-tagger App
//!
//! Process host for the tagging stage.
//!
//! This crate contains:
//! - Application context (configuration and stage wiring)
//! - The JSON-lines host that feeds stdin through the stage to stdout
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod host;

pub use context::AppContext;
pub use host::{parse_line, pump_lines, write_lines};
