//! Stage configuration
//!
//! Recognized options mirror the processor's configuration surface. Durations
//! accept either a number of seconds or a string with a unit suffix
//! (`"500ms"`, `"10s"`, `"1m"`, `"1h"`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMDS_API_VERSION, DEFAULT_IMDS_ENDPOINT, DEFAULT_MAX_PARALLEL_CALLS,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_TIMEOUT,
};
use crate::errors::{Result, TaggerError};
use crate::types::FieldSet;

/// Configuration of one enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Instance attributes to attach, restricted to the allow-list.
    #[serde(alias = "imds_tags")]
    pub fields: Vec<String>,
    /// Deadline for a single metadata fetch.
    #[serde(with = "duration_format")]
    pub timeout: Duration,
    /// Emit records in arrival order.
    pub ordered: bool,
    /// Number of records enriched concurrently.
    pub max_parallel_calls: usize,
    /// Depth of the input queue before `process` applies backpressure.
    pub queue_capacity: usize,
    /// Base URL of the metadata service.
    pub endpoint: String,
    pub api_version: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            ordered: false,
            max_parallel_calls: DEFAULT_MAX_PARALLEL_CALLS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
            api_version: DEFAULT_IMDS_API_VERSION.to_string(),
        }
    }
}

impl TaggerConfig {
    /// Configuration with the given fields and defaults elsewhere.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Validate the configuration, returning the field set to look up.
    ///
    /// # Errors
    /// Returns `TaggerError::Config` when the field list is empty or names a
    /// field outside the allow-list, or when a numeric option is zero.
    pub fn validate(&self) -> Result<FieldSet> {
        let fields = FieldSet::parse(&self.fields)?;

        if self.max_parallel_calls == 0 {
            return Err(TaggerError::Config("max_parallel_calls must be greater than 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(TaggerError::Config("queue_capacity must be greater than 0".into()));
        }
        if self.timeout.is_zero() {
            return Err(TaggerError::Config("timeout must be greater than 0".into()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(TaggerError::Config("endpoint must not be empty".into()));
        }

        Ok(fields)
    }
}

/// Parse a duration written as seconds (`"10"`, `"0.5"`) or with a unit
/// suffix (`"250ms"`, `"10s"`, `"2m"`, `"1h"`).
///
/// # Errors
/// Returns a description of the problem when the text is not a valid,
/// non-negative duration.
pub fn parse_duration(text: &str) -> std::result::Result<Duration, String> {
    let text = text.trim();
    let split = text.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(text.len());
    let (number, unit) = text.split_at(split);

    let value: f64 =
        number.trim().parse().map_err(|_| format!("invalid duration: {text:?}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration: {text:?}"));
    }

    let seconds = match unit {
        "ms" => value / 1000.0,
        "" | "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => return Err(format!("unknown duration unit {other:?} in {text:?}")),
    };

    Duration::try_from_secs_f64(seconds).map_err(|_| format!("invalid duration: {text:?}"))
}

/// Render a duration in the shortest exact unit accepted by
/// [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

mod duration_format {
    use std::fmt;
    use std::time::Duration;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number of seconds or a string such as \"10s\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative duration: {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Duration, E> {
            Duration::try_from_secs_f64(v).map_err(|_| E::custom(format!("invalid duration: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            super::parse_duration(v).map_err(E::custom)
        }
    }
}
