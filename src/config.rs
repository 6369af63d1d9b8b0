//! Configuration loading and management

use std::env;

/// Environment variable holding the log filter directive
const LOG_ENV: &str = "PCBEEP_LOG";

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Filter directive for the tracing subscriber
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// A missing or unreadable `PCBEEP_LOG` falls back to `info`.
    pub fn load() -> Self {
        let log_filter = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
        Self { log_filter }
    }
}
