//! Option Strategies
//!
//! Multi-leg positions priced leg by leg with Black-Scholes-Merton at each
//! leg's own implied vol. Aggregates are quantity-weighted sums.

use serde::{Deserialize, Serialize};

use crate::core::{AnalyticsResult, Greeks, MarketParams, OptionType, SkewError};
use crate::models::black_scholes;

/// A European option with everything needed to price it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedOption {
    pub strike: f64,
    /// Time to expiry in years
    pub time: f64,
    pub option_type: OptionType,
    pub implied_vol: f64,
    pub market: MarketParams,
}

impl PricedOption {
    pub fn new(
        strike: f64,
        time: f64,
        option_type: OptionType,
        implied_vol: f64,
        market: MarketParams,
    ) -> Self {
        Self {
            strike,
            time,
            option_type,
            implied_vol,
            market,
        }
    }

    pub fn price(&self) -> f64 {
        black_scholes::price(&self.market, self.strike, self.implied_vol, self.time, self.option_type)
    }

    pub fn delta(&self) -> f64 {
        black_scholes::delta(&self.market, self.strike, self.implied_vol, self.time, self.option_type)
    }

    pub fn greeks(&self) -> Greeks {
        black_scholes::greeks(&self.market, self.strike, self.implied_vol, self.time, self.option_type)
    }
}

/// One position in a strategy; negative quantity is short
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub option: PricedOption,
    pub quantity: f64,
}

impl Leg {
    pub fn long(option: PricedOption) -> Self {
        Self { option, quantity: 1.0 }
    }

    pub fn short(option: PricedOption) -> Self {
        Self {
            option,
            quantity: -1.0,
        }
    }
}

/// Named collection of legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub legs: Vec<Leg>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, legs: Vec<Leg>) -> Self {
        Self {
            name: name.into(),
            legs,
        }
    }

    /// Long put and long call
    pub fn risk_reversal(put: PricedOption, call: PricedOption) -> Self {
        Self::new("Risk Reversal", vec![Leg::long(put), Leg::long(call)])
    }

    /// Long put and long call, usually at the same strike
    pub fn straddle(put: PricedOption, call: PricedOption) -> Self {
        Self::new("Straddle", vec![Leg::long(put), Leg::long(call)])
    }

    /// Lower, two middle and upper options, all long
    pub fn butterfly(lower: PricedOption, middle: PricedOption, upper: PricedOption) -> Self {
        Self::new(
            "Butterfly",
            vec![Leg::long(lower), Leg::long(middle), Leg::long(middle), Leg::long(upper)],
        )
    }

    /// Net premium
    pub fn price(&self) -> f64 {
        self.legs.iter().map(|leg| leg.quantity * leg.option.price()).sum()
    }

    pub fn delta(&self) -> f64 {
        self.legs.iter().map(|leg| leg.quantity * leg.option.delta()).sum()
    }

    pub fn greeks(&self) -> Greeks {
        self.legs
            .iter()
            .fold(Greeks::default(), |acc, leg| acc.add(&leg.option.greeks().scale(leg.quantity)))
    }

    /// Premium divided by the expected move in the underlying
    pub fn break_even(&self, underlying_move: f64) -> AnalyticsResult<f64> {
        if underlying_move == 0.0 || !underlying_move.is_finite() {
            return Err(SkewError::invalid_input(
                "Underlying move must be finite and non-zero",
            ));
        }
        Ok(self.price() / underlying_move)
    }
}
