//! Volatility Surface
//!
//! Implied volatility grid over strike and expiry with bilinear interpolation,
//! plus a compact smile parameterization.

use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Implied volatility surface on a strike/expiry grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolSurface {
    /// Underlying symbol
    pub underlying: String,
    /// Reference spot price
    pub spot: f64,
    /// Valuation date
    pub reference_date: NaiveDate,
    /// Strikes (ascending)
    pub strikes: Vec<f64>,
    /// Times to expiry in years (ascending)
    pub times: Vec<f64>,
    /// Expiry dates (corresponding to times)
    pub expiry_dates: Vec<NaiveDate>,
    /// Volatility grid [strike, time] -> vol
    pub vols: Array2<f64>,
    /// Forward prices for each expiry
    pub forwards: Vec<f64>,
}

impl VolSurface {
    /// Build surface from a grid of (strike, time) vols
    #[allow(clippy::too_many_arguments)]
    pub fn from_grid(
        underlying: impl Into<String>,
        spot: f64,
        reference_date: NaiveDate,
        strikes: Vec<f64>,
        times: Vec<f64>,
        expiries: Vec<NaiveDate>,
        vols: Array2<f64>,
        forwards: Vec<f64>,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            reference_date,
            strikes,
            times,
            expiry_dates: expiries,
            vols,
            forwards,
        }
    }

    /// Interpolate volatility at (strike, time), flat outside the grid
    pub fn interpolate(&self, strike: f64, time: f64) -> Option<f64> {
        let (xi_lo, xi_hi, x_frac) = find_bracket(&self.strikes, strike)?;
        let (yi_lo, yi_hi, y_frac) = find_bracket(&self.times, time)?;

        // Bilinear interpolation
        let v00 = self.vols[[xi_lo, yi_lo]];
        let v10 = self.vols[[xi_hi, yi_lo]];
        let v01 = self.vols[[xi_lo, yi_hi]];
        let v11 = self.vols[[xi_hi, yi_hi]];

        let v0 = v00 * (1.0 - x_frac) + v10 * x_frac;
        let v1 = v01 * (1.0 - x_frac) + v11 * x_frac;

        Some(v0 * (1.0 - y_frac) + v1 * y_frac)
    }

    /// ATM (at-the-forward) volatility for each grid expiry
    pub fn atm_term_structure(&self) -> Vec<(f64, f64)> {
        self.times
            .iter()
            .zip(self.forwards.iter())
            .filter_map(|(&t, &f)| self.interpolate(f, t).map(|v| (t, v)))
            .collect()
    }

    /// Smile (strike, vol) for the grid column at `time`, interpolated between expiries
    pub fn smile_at_time(&self, time: f64) -> Option<Vec<(f64, f64)>> {
        let (yi_lo, yi_hi, y_frac) = find_bracket(&self.times, time)?;

        let smile = self
            .strikes
            .iter()
            .enumerate()
            .map(|(xi, &strike)| {
                let v_lo = self.vols[[xi, yi_lo]];
                let v_hi = self.vols[[xi, yi_hi]];
                (strike, v_lo * (1.0 - y_frac) + v_hi * y_frac)
            })
            .collect();

        Some(smile)
    }
}

/// Bracketing indices and interpolation fraction on an ascending axis
pub fn find_bracket(axis: &[f64], value: f64) -> Option<(usize, usize, f64)> {
    let last = axis.len().checked_sub(1)?;

    if value <= axis[0] {
        return Some((0, 0, 0.0));
    }
    if value >= axis[last] {
        return Some((last, last, 0.0));
    }

    axis.windows(2).enumerate().find_map(|(i, w)| {
        if value >= w[0] && value <= w[1] {
            let width = w[1] - w[0];
            let frac = if width > 0.0 { (value - w[0]) / width } else { 0.0 };
            Some((i, i + 1, frac))
        } else {
            None
        }
    })
}

/// Smile parameterization in log-moneyness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileParams {
    /// ATM volatility
    pub atm_vol: f64,
    /// Skew (slope at ATM)
    pub skew: f64,
    /// Curvature (smile convexity)
    pub curvature: f64,
}

impl SmileParams {
    /// Evaluate volatility at given log-moneyness
    pub fn vol_at(&self, log_moneyness: f64) -> f64 {
        let k = log_moneyness;
        (self.atm_vol + self.skew * k + self.curvature * k * k).max(0.001)
    }

    /// Least-squares quadratic fit σ(k) = a + b·k + c·k²
    ///
    /// Needs at least three distinct log-moneyness points.
    pub fn fit(log_moneyness: &[f64], vols: &[f64]) -> Option<Self> {
        if log_moneyness.len() < 3 || log_moneyness.len() != vols.len() {
            return None;
        }

        // Normal equations for [1, k, k²]
        let mut ata = [[0.0f64; 3]; 3];
        let mut atb = [0.0f64; 3];
        for (&k, &v) in log_moneyness.iter().zip(vols) {
            let row = [1.0, k, k * k];
            for i in 0..3 {
                for j in 0..3 {
                    ata[i][j] += row[i] * row[j];
                }
                atb[i] += row[i] * v;
            }
        }

        let [a, b, c] = solve_3x3(ata, atb)?;
        Some(Self {
            atm_vol: a,
            skew: b,
            curvature: c,
        })
    }
}

/// Gaussian elimination with partial pivoting
fn solve_3x3(mut m: [[f64; 3]; 3], mut rhs: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-14 {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..3 {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let tail: f64 = ((row + 1)..3).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Some(x)
}
