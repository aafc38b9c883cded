// =============================================================================
// Runtime Configuration — startup settings for the analysis backend
// =============================================================================
//
// Loaded once from a JSON file at startup; a missing or unreadable file
// degrades to defaults with a warning rather than refusing to start. Every
// field carries `#[serde(default)]` so an older config file keeps loading
// after new fields are added.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_symbol() -> String {
    "AAPL".to_string()
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_cache_capacity() -> usize {
    64
}

/// Startup configuration for the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Interface to bind the API server to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// API server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Symbol used when a query omits one.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Annual risk-free rate used when a query omits one (fraction, 0.02 = 2 %).
    #[serde(default = "default_risk_free_rate")]
    pub default_risk_free_rate: f64,

    /// Maximum number of memoized analysis results.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            default_symbol: default_symbol(),
            default_risk_free_rate: default_risk_free_rate(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl RuntimeConfig {
    /// Load from `path`.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed; the caller decides
    /// whether to fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = RuntimeConfig::default();
        assert_eq!(c.port, 8080);
        assert_eq!(c.default_symbol, "AAPL");
        assert!(c.cache_capacity > 0);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let c: RuntimeConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.bind_addr, "127.0.0.1");
        assert_eq!(c.default_risk_free_rate, 0.02);
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(RuntimeConfig::load("/nonexistent/quotelab.json").is_err());
    }
}
