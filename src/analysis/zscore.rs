//! Strike z-scores
//!
//! Two views of how unusual a strike's implied vol is:
//! - **Cross-sectional**: (σ_K − mean) / std over the whole smile
//! - **Robust local**: deviation from the median of neighbouring strikes,
//!   scaled by MAD, to flag dislocated strikes

use serde::{Deserialize, Serialize};

use crate::core::{mean_std, AnalyticsResult, SkewError, STRIKE_TOLERANCE};

/// Floor on the MAD scale
const MAD_EPSILON: f64 = 1e-6;

/// MAD to standard deviation under normality
const MAD_SCALE: f64 = 1.4826;

/// Z-scores for one strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeZScore {
    pub strike: f64,
    pub implied_vol: f64,
    /// Cross-sectional z-score; `None` when all vols are equal
    pub z_score: Option<f64>,
    /// Neighbourhood z-score; `None` near the edges of the smile
    pub robust_z: Option<f64>,
    /// |robust_z| at or above the threshold
    pub dislocated: bool,
}

/// Z-score of one strike's implied vol against all strikes
///
/// Uses the population standard deviation.
pub fn z_score(implied_vols: &[(f64, f64)], strike: f64) -> AnalyticsResult<f64> {
    let strike_vol = implied_vols
        .iter()
        .find(|(k, _)| (k - strike).abs() < STRIKE_TOLERANCE)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            SkewError::invalid_input(format!("No implied volatility found for strike {}", strike))
        })?;

    let vols: Vec<f64> = implied_vols.iter().map(|(_, v)| *v).collect();
    let (mean, std) = mean_std(&vols).ok_or_else(|| SkewError::data("Empty smile"))?;

    if std < 1e-12 {
        return Err(SkewError::numerical(
            "Implied vols have zero dispersion; z-score undefined",
        ));
    }

    Ok((strike_vol - mean) / std)
}

/// Z-scores for every strike of a (strike, vol) curve
pub fn strike_z_scores(curve: &[(f64, f64)], window: usize, threshold: f64) -> Vec<StrikeZScore> {
    let vols: Vec<f64> = curve.iter().map(|(_, v)| *v).collect();
    let stats = mean_std(&vols).filter(|(_, std)| *std >= 1e-12);
    let robust = robust_z_scores(&vols, window);

    curve
        .iter()
        .zip(robust)
        .map(|(&(strike, implied_vol), robust_z)| StrikeZScore {
            strike,
            implied_vol,
            z_score: stats.map(|(mean, std)| (implied_vol - mean) / std),
            robust_z,
            dislocated: robust_z.is_some_and(|z| z.abs() >= threshold),
        })
        .collect()
}

/// Robust z-scores against a ±window neighbourhood (centre excluded)
///
/// z_i = (σ_i − median(neighbourhood)) / max(1.4826 · MAD, ε)
pub fn robust_z_scores(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut z_scores = vec![None; n];
    if window == 0 || n < 2 * window + 1 {
        return z_scores;
    }

    for (i, z) in z_scores.iter_mut().enumerate().take(n - window).skip(window) {
        let (median, mad_scale) = neighborhood_stats(values, i, window);
        *z = Some((values[i] - median) / mad_scale.max(MAD_EPSILON));
    }

    z_scores
}

/// Neighbourhood median and MAD scale
fn neighborhood_stats(values: &[f64], center: usize, window: usize) -> (f64, f64) {
    let mut neighborhood: Vec<f64> = Vec::with_capacity(2 * window);
    for offset in 1..=window {
        if center >= offset {
            neighborhood.push(values[center - offset]);
        }
        if center + offset < values.len() {
            neighborhood.push(values[center + offset]);
        }
    }

    if neighborhood.is_empty() {
        return (values[center], 1.0);
    }

    let median = median_of(&mut neighborhood);
    let mut abs_devs: Vec<f64> = neighborhood.iter().map(|&x| (x - median).abs()).collect();
    let mad = median_of(&mut abs_devs);

    (median, MAD_SCALE * mad)
}

fn median_of(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
