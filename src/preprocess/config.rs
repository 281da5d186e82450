//! Configuration for quote cleaning

use serde::{Deserialize, Serialize};

/// Quote cleaning thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Maximum (ask - bid) / mid before a quote is dropped
    /// Default: 0.5
    pub max_relative_spread: f64,

    /// Minimum usable option price
    /// Default: 0.01
    pub min_price: f64,

    /// Require both bid and ask (ignore last-only quotes)
    /// Default: false
    pub require_two_sided: bool,

    /// Minimum days to expiry
    /// Default: 1
    pub min_days_to_expiry: i64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_relative_spread: 0.5,
            min_price: 0.01,
            require_two_sided: false,
            min_days_to_expiry: 1,
        }
    }
}

impl PreprocessConfig {
    /// Strict settings: two-sided, tight markets only
    pub fn strict() -> Self {
        Self {
            max_relative_spread: 0.2,
            min_price: 0.05,
            require_two_sided: true,
            min_days_to_expiry: 2,
        }
    }

    /// Permissive settings: keep anything with a price
    pub fn permissive() -> Self {
        Self {
            max_relative_spread: f64::MAX,
            min_price: 0.0,
            require_two_sided: false,
            min_days_to_expiry: 1,
        }
    }
}
