//! Configuration for smile construction and skew measurement

use serde::{Deserialize, Serialize};

/// Which quotes feed the smile at each strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmileSide {
    /// Out-of-the-money option at each strike (puts below the forward,
    /// calls at or above), falling back to the ITM side when missing
    OutOfTheMoney,
    /// Calls only
    Calls,
    /// Puts only
    Puts,
    /// Both sides; vols at a shared strike are averaged on the curve
    Both,
}

/// Smile and skew settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileConfig {
    /// Quote selection per strike
    /// Default: OutOfTheMoney
    pub side: SmileSide,

    /// Absolute delta for risk reversal and butterfly wings
    /// Default: 0.25
    pub wing_delta: f64,

    /// Moneyness offset for the put/call wing spread (0.10 = 90% vs 110% of forward)
    /// Default: 0.10
    pub wing_moneyness: f64,

    /// Neighbourhood half-width (strikes) for robust z-scores
    /// Default: 2
    pub dislocation_window: usize,

    /// |robust z| at or above which a strike is flagged as dislocated
    /// Default: 2.5
    pub dislocation_threshold: f64,

    /// Build the strike/expiry surface grid
    /// Default: true
    pub build_surface: bool,
}

impl Default for SmileConfig {
    fn default() -> Self {
        Self {
            side: SmileSide::OutOfTheMoney,
            wing_delta: 0.25,
            wing_moneyness: 0.10,
            dislocation_window: 2,
            dislocation_threshold: 2.5,
            build_surface: true,
        }
    }
}
