//! Client configuration structures

use serde::{Deserialize, Serialize};

/// Default origin for single-entity REST calls.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.tasklink.app/rest/v2/";
/// Default origin for batch ("sync") calls.
pub const DEFAULT_SYNC_BASE_URL: &str = "https://api.tasklink.app/sync/v9/";
/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default number of automatic retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default delay between retries (the first retry is immediate).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bearer credential. Requests are sent unauthenticated when absent.
    pub api_token: Option<String>,
    pub rest_base_url: String,
    pub sync_base_url: String,
    /// Per-attempt timeout. `None` or `Some(0)` disables the timer.
    pub timeout_ms: Option<u64>,
    pub retry: RetrySettings,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            sync_base_url: DEFAULT_SYNC_BASE_URL.to_string(),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            retry: RetrySettings::default(),
            user_agent: None,
        }
    }
}

/// Retry knobs exposed through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { retries: DEFAULT_RETRIES, retry_delay_ms: DEFAULT_RETRY_DELAY_MS }
    }
}
