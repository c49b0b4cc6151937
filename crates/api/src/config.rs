//! Application configuration loaded from environment variables.

use lifecycle::ReclaimerConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `RECLAIM_PERIOD_SECS` — timeout sweep interval (default: `300`)
/// - `RECLAIM_DELAY_SECS` — age before a pending check-in is reclaimed (default: `300`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub reclaim_period_secs: u64,
    pub reclaim_delay_secs: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            reclaim_period_secs: std::env::var("RECLAIM_PERIOD_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
            reclaim_delay_secs: std::env::var("RECLAIM_DELAY_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the reclaimer timing derived from this configuration.
    pub fn reclaimer(&self) -> ReclaimerConfig {
        ReclaimerConfig {
            period: std::time::Duration::from_secs(self.reclaim_period_secs),
            delay: chrono::Duration::seconds(self.reclaim_delay_secs),
            ..ReclaimerConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            reclaim_period_secs: 300,
            reclaim_delay_secs: 300,
        }
    }
}
