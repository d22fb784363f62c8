//! Configuration loader
//!
//! Loads the stage configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. An explicit file path, when given, is the only source
//! 2. Otherwise, attempts to load from environment variables
//! 3. If `IMDS_TAGGER_FIELDS` is unset, falls back to probing for a file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `IMDS_TAGGER_FIELDS`: Comma-separated metadata fields (required)
//! - `IMDS_TAGGER_TIMEOUT`: Request deadline, seconds or `500ms`/`10s`/`1m`
//! - `IMDS_TAGGER_ORDERED`: Preserve arrival order (true/false)
//! - `IMDS_TAGGER_MAX_PARALLEL_CALLS`: Concurrent enrichment limit
//! - `IMDS_TAGGER_QUEUE_CAPACITY`: Input queue depth
//! - `IMDS_TAGGER_ENDPOINT`: Metadata service base URL
//! - `IMDS_TAGGER_API_VERSION`: Metadata API version
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./imds-tagger.toml` or `./imds-tagger.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use imds_tagger_domain::{parse_duration, Result, TaggerConfig, TaggerError};

const FIELDS_VAR: &str = "IMDS_TAGGER_FIELDS";
const TIMEOUT_VAR: &str = "IMDS_TAGGER_TIMEOUT";
const ORDERED_VAR: &str = "IMDS_TAGGER_ORDERED";
const MAX_PARALLEL_VAR: &str = "IMDS_TAGGER_MAX_PARALLEL_CALLS";
const QUEUE_CAPACITY_VAR: &str = "IMDS_TAGGER_QUEUE_CAPACITY";
const ENDPOINT_VAR: &str = "IMDS_TAGGER_ENDPOINT";
const API_VERSION_VAR: &str = "IMDS_TAGGER_API_VERSION";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["imds-tagger.toml", "imds-tagger.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// With `path` set, the file is loaded and nothing else is consulted.
/// Otherwise environment variables are tried first, then a probed file.
/// The returned configuration is not yet validated; stage construction does
/// that.
///
/// # Errors
/// Returns `TaggerError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - An environment value cannot be parsed
pub fn load(path: Option<PathBuf>) -> Result<TaggerConfig> {
    if path.is_some() {
        return load_from_file(path);
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) if std::env::var_os(FIELDS_VAR).is_some() => Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `IMDS_TAGGER_FIELDS` is required; every other variable falls back to its
/// default when unset.
///
/// # Errors
/// Returns `TaggerError::Config` if the field list is missing or a value is
/// invalid.
pub fn load_from_env() -> Result<TaggerConfig> {
    let fields: Vec<String> = env_var(FIELDS_VAR)?
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    let mut config = TaggerConfig { fields, ..TaggerConfig::default() };

    if let Ok(raw) = std::env::var(TIMEOUT_VAR) {
        config.timeout = parse_duration(&raw)
            .map_err(|e| TaggerError::Config(format!("Invalid timeout: {}", e)))?;
    }
    config.ordered = env_bool(ORDERED_VAR, config.ordered);
    if let Ok(raw) = std::env::var(MAX_PARALLEL_VAR) {
        config.max_parallel_calls = raw.parse::<usize>().map_err(|e| {
            TaggerError::Config(format!("Invalid max parallel calls: {}", e))
        })?;
    }
    if let Ok(raw) = std::env::var(QUEUE_CAPACITY_VAR) {
        config.queue_capacity = raw
            .parse::<usize>()
            .map_err(|e| TaggerError::Config(format!("Invalid queue capacity: {}", e)))?;
    }
    if let Ok(endpoint) = std::env::var(ENDPOINT_VAR) {
        config.endpoint = endpoint;
    }
    if let Ok(api_version) = std::env::var(API_VERSION_VAR) {
        config.api_version = api_version;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for a config file.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TaggerError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<TaggerConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaggerError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaggerError::Config(format!(
                "{} is not set and no config file found in any of the standard locations",
                FIELDS_VAR
            ))
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TaggerError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<TaggerConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TaggerError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TaggerError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TaggerError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for a configuration file
///
/// Searches the current working directory first, then the directory holding
/// the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `TaggerError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TaggerError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
