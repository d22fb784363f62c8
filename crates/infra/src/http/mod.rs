//! HTTP access to the instance metadata service.

mod client;

pub use client::{ImdsClient, ImdsClientBuilder};
