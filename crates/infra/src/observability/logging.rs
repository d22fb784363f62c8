//! Tracing subscriber setup.
//!
//! Log lines always go to stderr: stdout belongs to the record stream when
//! the stage runs as a filter process.

use std::str::FromStr;

use imds_tagger_domain::{Result, TaggerError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the output format.
pub const LOG_FORMAT_VAR: &str = "IMDS_TAGGER_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TaggerError::Config(format!("Unsupported log format: {other}"))),
        }
    }
}

impl LogFormat {
    /// Read the format from `IMDS_TAGGER_LOG_FORMAT`, defaulting to pretty.
    pub fn from_env() -> Result<Self> {
        std::env::var(LOG_FORMAT_VAR).map_or(Ok(Self::default()), |raw| raw.parse())
    }
}

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` when set, `info` otherwise.
///
/// # Errors
/// `TaggerError::Config` for an unknown format, `TaggerError::Internal` if a
/// global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|err| TaggerError::Internal(format!("failed to install logger: {err}")))
}
