//! Error conversions between infrastructure crates and the domain error.

mod conversions;

pub use conversions::InfraError;
