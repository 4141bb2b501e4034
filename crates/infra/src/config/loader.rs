//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `TASKLINK_API_TOKEN` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TASKLINK_API_TOKEN`: Bearer credential (required for env loading)
//! - `TASKLINK_REST_URL`: REST base URL
//! - `TASKLINK_SYNC_URL`: Batch (sync) base URL
//! - `TASKLINK_TIMEOUT_MS`: Per-attempt timeout in milliseconds, `0` disables
//! - `TASKLINK_RETRIES`: Automatic retries for network failures
//! - `TASKLINK_RETRY_DELAY_MS`: Delay between retries after the first
//! - `TASKLINK_USER_AGENT`: User-Agent header value
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tasklink.json` or `./tasklink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../tasklink.json` or `../tasklink.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tasklink_domain::{ClientConfig, Result, RetrySettings, TaskLinkError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the token variable
/// is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns a `Config` error if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A variable holds an unparseable value
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `TASKLINK_API_TOKEN` is required; every other value falls back to
/// the [`ClientConfig`] default.
///
/// # Errors
/// Returns a `Config` error if the token is missing or a numeric variable
/// cannot be parsed.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();
    let api_token = env_var("TASKLINK_API_TOKEN")?;

    let timeout_ms = match env_parse::<u64>("TASKLINK_TIMEOUT_MS")? {
        Some(0) => None,
        Some(ms) => Some(ms),
        None => defaults.timeout_ms,
    };

    let retry = RetrySettings {
        retries: env_parse("TASKLINK_RETRIES")?.unwrap_or(defaults.retry.retries),
        retry_delay_ms: env_parse("TASKLINK_RETRY_DELAY_MS")?
            .unwrap_or(defaults.retry.retry_delay_ms),
    };

    Ok(ClientConfig {
        api_token: Some(api_token),
        rest_base_url: std::env::var("TASKLINK_REST_URL").unwrap_or(defaults.rest_base_url),
        sync_base_url: std::env::var("TASKLINK_SYNC_URL").unwrap_or(defaults.sync_base_url),
        timeout_ms,
        retry,
        user_agent: std::env::var("TASKLINK_USER_AGENT").ok(),
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns a `Config` error if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaskLinkError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaskLinkError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        TaskLinkError::config(format!("Failed to read config file: {e}")).with_source(e)
    })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| {
            TaskLinkError::config(format!("Invalid TOML format: {e}")).with_source(e)
        }),
        "json" => serde_json::from_str(contents).map_err(|e| {
            TaskLinkError::config(format!("Invalid JSON format: {e}")).with_source(e)
        }),
        _ => Err(TaskLinkError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["tasklink.json", "tasklink.toml", "config.json", "config.toml"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
        candidates.extend(NAMES[..2].iter().map(|name| cwd.join("..").join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TaskLinkError::config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TaskLinkError::config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
