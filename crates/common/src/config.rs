//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Every setting has a default;
//! the library never requires environment setup to function.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level for the tracing subscriber
    pub log_level: String,

    /// Default lifetime used for the Expires cache header, in seconds
    pub default_max_age_secs: u64,

    /// Upper bound enforced on client-supplied page limits
    pub page_limit_max: i64,

    /// Quote character stripped from entity tags during comparison
    pub etag_quote: char,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            default_max_age_secs: env::var("CACHE_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),

            page_limit_max: env::var("PAGE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),

            etag_quote: env::var("ETAG_QUOTE")
                .ok()
                .and_then(|v| v.chars().next())
                .unwrap_or('"'),
        };

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_max_age_secs: 60,
            page_limit_max: 100,
            etag_quote: '"',
        }
    }
}
