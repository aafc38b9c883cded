// =============================================================================
// Shared types used across the QuoteLab analysis backend
// =============================================================================

use serde::{Deserialize, Serialize};

/// Bar granularity supported by the market-data provider.
///
/// The serialized form matches the provider's interval strings (`1d`, `1h`,
/// `30m`, `15m`) so the value can be passed straight through from the API
/// query string to the provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "30m")]
    ThirtyMin,
    #[serde(rename = "15m")]
    FifteenMin,
}

impl Granularity {
    /// Provider interval string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Hourly => "1h",
            Self::ThirtyMin => "30m",
            Self::FifteenMin => "15m",
        }
    }

    /// Volatility and Sharpe are only meaningful on daily bars.
    pub fn is_daily(self) -> bool {
        matches!(self, Self::Daily)
    }

    /// How far back the provider serves history for this granularity, in
    /// days. Intraday intervals are hard provider limits; daily is
    /// effectively unbounded and capped at 50 years for range purposes.
    pub fn history_limit_days(self) -> i64 {
        match self {
            Self::Daily => 50 * 365,
            Self::Hourly => 730,
            Self::ThirtyMin | Self::FifteenMin => 60,
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Daily
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moving-average flavour for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaKind {
    #[serde(rename = "sma")]
    Simple,
    #[serde(rename = "ema")]
    Exponential,
}

impl Default for MaKind {
    fn default() -> Self {
        Self::Simple
    }
}

impl std::fmt::Display for MaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "SMA"),
            Self::Exponential => write!(f, "EMA"),
        }
    }
}
