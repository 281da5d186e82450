//! Option Greeks
//!
//! Sensitivities in desk conventions: vega and rho per 1% move, theta per calendar day.

use serde::{Deserialize, Serialize};

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS (sensitivity to spot)
    pub delta: f64,
    /// Gamma: d²V/dS² (sensitivity of delta to spot)
    pub gamma: f64,
    /// Theta: dV/dt per calendar day
    pub theta: f64,
    /// Vega: dV/dσ per 1 vol point
    pub vega: f64,
    /// Rho: dV/dr per 1 rate point
    pub rho: f64,
    /// Vanna: d²V/dSdσ (sensitivity of delta to vol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vanna: Option<f64>,
    /// Volga/Vomma: d²V/dσ² (sensitivity of vega to vol)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volga: Option<f64>,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, theta: f64, vega: f64, rho: f64) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
            rho,
            vanna: None,
            volga: None,
        }
    }

    /// Scale Greeks by a factor (position size, contract multiplier)
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
            vanna: self.vanna.map(|v| v * factor),
            volga: self.volga.map(|v| v * factor),
        }
    }

    /// Add two Greeks (for strategies)
    pub fn add(&self, other: &Greeks) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
            vanna: add_optional(self.vanna, other.vanna),
            volga: add_optional(self.volga, other.volga),
        }
    }
}

fn add_optional(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (Some(a), None) | (None, Some(a)) => Some(a),
        _ => None,
    }
}
