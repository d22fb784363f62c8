//! Wiring of the production adapters into a stage.

use std::sync::Arc;

use imds_tagger_core::TaggerStage;
use imds_tagger_domain::{Result, TaggerConfig};
use tracing::info;

use crate::cache::MokaAttributeCache;
use crate::http::ImdsClient;

/// Build a stopped stage backed by the HTTP metadata client and a fresh
/// moka attribute cache.
///
/// Each call creates its own client and cache, so stages never share state.
///
/// # Errors
/// `TaggerError::Config` if `config` is invalid or the client cannot be
/// built.
pub fn build_stage(config: &TaggerConfig) -> Result<TaggerStage> {
    // Validate before building the client so field errors surface first.
    config.validate()?;

    let client = ImdsClient::from_config(config)?;
    info!(url = client.url(), api_version = %config.api_version, "Using instance metadata endpoint");

    TaggerStage::new(config, Arc::new(client), Arc::new(MokaAttributeCache::default()))
}
