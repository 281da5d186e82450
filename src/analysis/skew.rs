//! Skew measurement
//!
//! Summary statistics of the volatility-vs-strike curve for one expiry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    mean_std, AnalyticsResult, Greeks, ImpliedVolatilityPoint, OptionType, SmileParams, DAYS_PER_YEAR,
};
use crate::models::black_scholes;

use super::{strike_z_scores, z_score, SmileConfig, StrikeZScore, VolSmile};

/// Skew statistics for one expiry
///
/// Every metric is optional: thin smiles may not support all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkewMetrics {
    /// At-the-forward implied vol
    pub atm_vol: Option<f64>,
    /// σ(wing-delta call) − σ(wing-delta put); negative for equity-style skew
    pub risk_reversal: Option<f64>,
    /// (σ(wing call) + σ(wing put)) / 2 − σ_ATM
    pub butterfly: Option<f64>,
    /// Least-squares slope dσ/d ln(K/F)
    pub slope: Option<f64>,
    /// Quadratic coefficient of the fitted smile
    pub curvature: Option<f64>,
    /// σ(F·(1−m)) − σ(F·(1+m)) for the configured wing moneyness m
    pub put_call_skew: Option<f64>,
    /// Sample skewness (third standardized moment) of the implied vols
    pub skewness: Option<f64>,
    /// Lowest and highest implied vol on the curve
    pub min_vol: Option<f64>,
    pub max_vol: Option<f64>,
}

/// Terminal output for one expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkewResult {
    /// Underlying symbol
    pub underlying: String,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Time to expiry in years
    pub time_to_expiry: f64,
    /// Forward price
    pub forward: f64,
    /// Skew statistics
    pub metrics: SkewMetrics,
    /// Strike nearest the forward, where the Greeks are evaluated
    pub atm_strike: Option<f64>,
    /// Call Greeks at the ATM strike and vol
    pub call_greeks: Option<Greeks>,
    /// Put Greeks at the ATM strike and vol
    pub put_greeks: Option<Greeks>,
    /// Solved points
    pub points: Vec<ImpliedVolatilityPoint>,
    /// Per-strike z-scores
    pub z_scores: Vec<StrikeZScore>,
    /// Quotes that could not be inverted
    pub failed_solves: usize,
}

impl SkewResult {
    /// Strikes flagged as dislocated from their neighbours
    pub fn dislocations(&self) -> Vec<&StrikeZScore> {
        self.z_scores.iter().filter(|z| z.dislocated).collect()
    }

    pub fn days_to_expiry(&self) -> f64 {
        self.time_to_expiry * DAYS_PER_YEAR
    }

    /// Cross-sectional z-score of one quoted strike
    pub fn strike_z_score(&self, strike: f64) -> AnalyticsResult<f64> {
        let curve: Vec<(f64, f64)> = self.z_scores.iter().map(|z| (z.strike, z.implied_vol)).collect();
        z_score(&curve, strike)
    }
}

/// Measure a solved smile
pub fn measure_skew(smile: &VolSmile, config: &SmileConfig) -> SkewResult {
    let metrics = compute_metrics(smile, config);

    let atm_strike = smile.atm_strike();
    let atm_greeks = atm_strike.and_then(|k| smile.vol_at_strike(k).map(|v| (k, v)));
    let greeks_for = |option_type| {
        atm_greeks.map(|(k, v)| black_scholes::greeks(&smile.params, k, v, smile.time, option_type))
    };

    SkewResult {
        underlying: smile.underlying.clone(),
        expiry: smile.expiry,
        time_to_expiry: smile.time,
        forward: smile.forward(),
        metrics,
        atm_strike,
        call_greeks: greeks_for(OptionType::Call),
        put_greeks: greeks_for(OptionType::Put),
        points: smile.points.clone(),
        z_scores: strike_z_scores(&smile.curve(), config.dislocation_window, config.dislocation_threshold),
        failed_solves: smile.failed,
    }
}

/// Compute skew statistics for a smile
pub fn compute_metrics(smile: &VolSmile, config: &SmileConfig) -> SkewMetrics {
    let curve = smile.curve();
    if curve.is_empty() {
        return SkewMetrics::default();
    }

    let forward = smile.forward();
    let ks: Vec<f64> = curve.iter().map(|(k, _)| (k / forward).ln()).collect();
    let vols: Vec<f64> = curve.iter().map(|(_, v)| *v).collect();

    let atm_vol = smile.atm_vol();
    let call_wing = smile.vol_at_delta(config.wing_delta, OptionType::Call);
    let put_wing = smile.vol_at_delta(-config.wing_delta, OptionType::Put);

    let risk_reversal = match (call_wing, put_wing) {
        (Some(c), Some(p)) => Some(c - p),
        _ => None,
    };
    let butterfly = match (call_wing, put_wing, atm_vol) {
        (Some(c), Some(p), Some(atm)) => Some((c + p) / 2.0 - atm),
        _ => None,
    };

    let low_strike = forward * (1.0 - config.wing_moneyness);
    let high_strike = forward * (1.0 + config.wing_moneyness);
    let put_call_skew = if smile.covers(low_strike) && smile.covers(high_strike) {
        match (smile.vol_at_strike(low_strike), smile.vol_at_strike(high_strike)) {
            (Some(lo), Some(hi)) => Some(lo - hi),
            _ => None,
        }
    } else {
        None
    };

    SkewMetrics {
        atm_vol,
        risk_reversal,
        butterfly,
        slope: regression_slope(&ks, &vols),
        curvature: SmileParams::fit(&ks, &vols).map(|p| p.curvature),
        put_call_skew,
        skewness: sample_skewness(&vols),
        min_vol: vols.iter().copied().reduce(f64::min),
        max_vol: vols.iter().copied().reduce(f64::max),
    }
}

/// Ordinary least-squares slope of y on x
pub fn regression_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mean_x) * (b - mean_y)).sum();
    let sxx: f64 = x.iter().map(|a| (a - mean_x).powi(2)).sum();

    if sxx < 1e-14 {
        return None;
    }
    Some(sxy / sxx)
}

/// Biased sample skewness m3 / m2^(3/2)
pub fn sample_skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let (mean, std) = mean_std(values)?;
    if std < 1e-12 {
        return None;
    }
    let n = values.len() as f64;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    Some(m3 / std.powi(3))
}
