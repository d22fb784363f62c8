//! Error types used throughout the stage

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for imds-tagger
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TaggerError {
    /// Invalid or empty configuration. Fatal: the stage does not start.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure, timeout, or error status from the metadata endpoint.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The metadata response was not a well-formed attribute document.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Lifecycle misuse (processing before start, starting twice, ...).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaggerError {
    /// Stable label suitable for structured logging fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::InvalidState(_) => "invalid_state",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error is contained per record (the record passes through
    /// untagged) rather than surfaced to the host.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}

/// Result type alias for imds-tagger operations
pub type Result<T> = std::result::Result<T, TaggerError>;
