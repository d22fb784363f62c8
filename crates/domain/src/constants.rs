//! Stage constants
//!
//! Centralized location for the defaults and fixed values of the stage.

use std::time::Duration;

// Metadata endpoint
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";
pub const IMDS_COMPUTE_PATH: &str = "/metadata/instance/compute";
pub const IMDS_MARKER_HEADER: &str = "Metadata";
pub const IMDS_MARKER_VALUE: &str = "True";
pub const DEFAULT_IMDS_FORMAT: &str = "json";
pub const DEFAULT_IMDS_API_VERSION: &str = "2021-02-01";

// Per-fetch deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Worker pool and queues
pub const DEFAULT_MAX_PARALLEL_CALLS: usize = 10;
pub const DEFAULT_MAX_ORDERED_QUEUE_SIZE: usize = 10_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

// Attribute cache
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);
