//! Implied volatility observations

use serde::{Deserialize, Serialize};

use super::option::OptionType;

/// Implied volatility recovered from one quote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityPoint {
    /// Strike price
    pub strike: f64,
    /// Solved implied volatility (annualized, decimal)
    pub implied_vol: f64,
    /// Type of the option the vol was solved from
    pub option_type: OptionType,
    /// Market price used for the solve
    pub price: f64,
    /// ln(K/F)
    pub log_moneyness: f64,
    /// Delta of the quoted option at the solved vol
    pub delta: f64,
}

impl ImpliedVolatilityPoint {
    /// Moneyness K/F
    pub fn moneyness(&self) -> f64 {
        self.log_moneyness.exp()
    }
}

/// Population mean and standard deviation (divides by n)
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}
