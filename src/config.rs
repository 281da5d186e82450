//! Run configuration
//!
//! One JSON document covers every stage. All fields are defaulted, so a
//! config file only needs the values it overrides:
//!
//! ```json
//! { "market": { "rate": 0.045 }, "smile": { "side": "both" } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::SmileConfig;
use crate::core::{AnalyticsResult, MarketParams};
use crate::models::black_scholes::SolverConfig;
use crate::preprocess::PreprocessConfig;

/// Rate inputs for the pricing model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Continuously compounded risk-free (domestic) rate
    /// Default: 0.05
    pub rate: f64,

    /// Continuous dividend yield, or the foreign rate for FX
    /// Default: 0.0
    pub dividend_yield: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            rate: 0.05,
            dividend_yield: 0.0,
        }
    }
}

impl MarketConfig {
    /// FX rates (Garman-Kohlhagen)
    pub fn fx(domestic_rate: f64, foreign_rate: f64) -> Self {
        Self {
            rate: domestic_rate,
            dividend_yield: foreign_rate,
        }
    }

    /// Pricing inputs at the given spot
    pub fn params(&self, spot: f64) -> MarketParams {
        MarketParams::equity(spot, self.rate, self.dividend_yield)
    }
}

/// Configuration for a full analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub market: MarketConfig,
    pub preprocess: PreprocessConfig,
    pub solver: SolverConfig,
    pub smile: SmileConfig,
}

impl AnalysisConfig {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> AnalyticsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Tight markets, two-sided quotes only
    pub fn strict() -> Self {
        Self {
            preprocess: PreprocessConfig::strict(),
            ..Self::default()
        }
    }

    /// Keep every priced quote
    pub fn permissive() -> Self {
        Self {
            preprocess: PreprocessConfig::permissive(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SmileSide;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json(
            r#"{ "market": { "rate": 0.045 }, "smile": { "side": "both" } }"#,
        )
        .unwrap();

        assert!((config.market.rate - 0.045).abs() < 1e-12);
        assert_eq!(config.market.dividend_yield, 0.0);
        assert_eq!(config.smile.side, SmileSide::Both);
        assert!((config.smile.wing_delta - 0.25).abs() < 1e-12);
        assert_eq!(config.solver.max_iterations, 100);
        assert!((config.preprocess.max_relative_spread - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_file_roundtrip() {
        let config = AnalysisConfig::strict();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_file(file.path()).unwrap();
        assert!(loaded.preprocess.require_two_sided);
        assert_eq!(loaded.preprocess.min_days_to_expiry, 2);
    }

    #[test]
    fn test_bad_config() {
        assert!(AnalysisConfig::from_json("{ not json").is_err());
        assert!(AnalysisConfig::from_file("/nonexistent/skew.json").is_err());
    }

    #[test]
    fn test_fx_market() {
        let params = MarketConfig::fx(0.03, 0.01).params(1.1);
        assert!((params.forward(1.0) - 1.1 * (0.02f64).exp()).abs() < 1e-12);
    }
}
