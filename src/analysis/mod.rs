//! Skew Analysis
//!
//! Turns cleaned quotes into per-expiry smiles and skew statistics.
//!
//! Pipeline per expiry:
//! 1. **Smile**: invert each strike's price to an implied vol
//! 2. **Skew**: risk reversal, butterfly, slope, curvature, wing spread, skewness
//! 3. **Z-scores**: cross-sectional and neighbourhood scores per strike
//!
//! Across expiries the analyzer adds an ATM term structure and an implied
//! vol surface grid.

mod analyzer;
mod config;
mod skew;
mod smile;
mod zscore;

pub use analyzer::*;
pub use config::*;
pub use skew::*;
pub use smile::*;
pub use zscore::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsResult, MarketParams, SkewError, VolSurface};
use crate::preprocess::CleaningReport;

/// ATM vol and skew for one expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    pub expiry: NaiveDate,
    /// Time to expiry in years
    pub time: f64,
    pub atm_vol: Option<f64>,
    pub risk_reversal: Option<f64>,
    pub slope: Option<f64>,
}

impl From<&SkewResult> for TermPoint {
    fn from(result: &SkewResult) -> Self {
        Self {
            expiry: result.expiry,
            time: result.time_to_expiry,
            atm_vol: result.metrics.atm_vol,
            risk_reversal: result.metrics.risk_reversal,
            slope: result.metrics.slope,
        }
    }
}

/// Expiry left out because none of its strikes could be solved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkippedExpiry {
    pub expiry: NaiveDate,
    pub failed_solves: usize,
}

/// Output of a full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Underlying symbol
    pub underlying: String,
    /// Spot price used for pricing
    pub spot: f64,
    /// Valuation date
    pub valuation_date: NaiveDate,
    /// Rates used for pricing
    pub market: MarketParams,
    /// One result per solved expiry, nearest first
    pub results: Vec<SkewResult>,
    /// Expiries with no solved strikes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedExpiry>,
    /// ATM term structure
    pub term_structure: Vec<TermPoint>,
    /// Preprocessing summary
    pub cleaning: CleaningReport,
    /// Implied vol grid across expiries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<VolSurface>,
}

impl AnalysisReport {
    /// Result for an exact expiry
    pub fn result_for(&self, expiry: NaiveDate) -> Option<&SkewResult> {
        self.results.iter().find(|r| r.expiry == expiry)
    }

    /// Nearest solved expiry
    pub fn front(&self) -> Option<&SkewResult> {
        self.results.first()
    }

    /// Z-score of a strike, on the given expiry or the front expiry
    pub fn z_score(&self, strike: f64, expiry: Option<NaiveDate>) -> AnalyticsResult<f64> {
        let result = match expiry {
            Some(date) => self
                .result_for(date)
                .ok_or_else(|| SkewError::invalid_input(format!("No solved smile for expiry {}", date)))?,
            None => self
                .front()
                .ok_or_else(|| SkewError::data("Report has no solved expiries"))?,
        };
        result.strike_z_score(strike)
    }

    /// Every dislocated strike as (expiry, score)
    pub fn dislocations(&self) -> Vec<(NaiveDate, &StrikeZScore)> {
        self.results
            .iter()
            .flat_map(|r| r.dislocations().into_iter().map(move |z| (r.expiry, z)))
            .collect()
    }

    /// Total quotes the solver could not invert, skipped expiries included
    pub fn failed_solves(&self) -> usize {
        let solved: usize = self.results.iter().map(|r| r.failed_solves).sum();
        let skipped: usize = self.skipped.iter().map(|s| s.failed_solves).sum();
        solved + skipped
    }
}
