//! Application context - configuration plus the stage it configures

use std::path::PathBuf;

use imds_tagger_core::TaggerStage;
use imds_tagger_domain::{Result, TaggerConfig};
use imds_tagger_infra::{build_stage, config};
use tracing::info;

/// Application context - holds the loaded configuration and the stage built
/// from it.
pub struct AppContext {
    pub config: TaggerConfig,
    pub stage: TaggerStage,
}

impl AppContext {
    /// Load configuration (explicit path, environment, then probed files) and
    /// build a stopped stage.
    ///
    /// # Errors
    /// `TaggerError::Config` when no valid configuration is found.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = config::load(config_path)?;
        Self::from_config(config)
    }

    /// Build the context from an already loaded configuration.
    ///
    /// # Errors
    /// `TaggerError::Config` when `config` is invalid.
    pub fn from_config(config: TaggerConfig) -> Result<Self> {
        let stage = build_stage(&config)?;
        info!(
            fields = ?config.fields,
            ordered = config.ordered,
            max_parallel_calls = config.max_parallel_calls,
            "Application context initialized"
        );
        Ok(Self { config, stage })
    }
}
