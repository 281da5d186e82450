//! Option contract definitions
//!
//! Vanilla European option contracts and the market inputs needed to value them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::SkewError;

/// Days per year used for time-to-expiry (ACT/365)
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OptionType {
    type Err = SkewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(SkewError::invalid_input(format!(
                "Option type must be 'call' or 'put', got '{}'",
                other
            ))),
        }
    }
}

/// Option contract specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol (e.g., "SPY", "EURUSD")
    pub underlying: String,
    /// Strike price
    pub strike: f64,
    /// Expiration date
    pub expiry: NaiveDate,
    /// Option type (Call/Put)
    pub option_type: OptionType,
}

impl OptionContract {
    pub fn new(
        underlying: impl Into<String>,
        strike: f64,
        expiry: NaiveDate,
        option_type: OptionType,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            strike,
            expiry,
            option_type,
        }
    }

    /// Time to expiry in years from given date
    pub fn time_to_expiry(&self, from: NaiveDate) -> f64 {
        year_fraction(from, self.expiry)
    }

    /// Log-moneyness against a forward: ln(K/F)
    pub fn log_moneyness(&self, forward: f64) -> f64 {
        (self.strike / forward).ln()
    }

    /// Out of the money relative to the forward; a call struck at the
    /// forward counts as OTM so every strike has exactly one OTM side
    pub fn is_otm(&self, forward: f64) -> bool {
        match self.option_type {
            OptionType::Call => self.strike >= forward,
            OptionType::Put => self.strike < forward,
        }
    }
}

/// Year fraction between two dates (ACT/365). Negative when `to` precedes `from`.
pub fn year_fraction(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Market inputs for the pricing model
///
/// For FX options the foreign interest rate plays the role of the dividend
/// yield (Garman-Kohlhagen).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Spot price of the underlying
    pub spot: f64,
    /// Continuously compounded risk-free (domestic) rate
    pub rate: f64,
    /// Continuous dividend yield (or foreign rate)
    pub dividend_yield: f64,
}

impl MarketParams {
    /// Equity underlying with continuous dividend yield
    pub fn equity(spot: f64, rate: f64, dividend_yield: f64) -> Self {
        Self {
            spot,
            rate,
            dividend_yield,
        }
    }

    /// FX pair: domestic rate discounts, foreign rate is the carry
    pub fn fx(spot: f64, domestic_rate: f64, foreign_rate: f64) -> Self {
        Self {
            spot,
            rate: domestic_rate,
            dividend_yield: foreign_rate,
        }
    }

    /// Forward price F = S * exp((r - q) * T)
    pub fn forward(&self, time: f64) -> f64 {
        self.spot * ((self.rate - self.dividend_yield) * time).exp()
    }

    /// Discount factor exp(-r * T)
    pub fn discount(&self, time: f64) -> f64 {
        (-self.rate * time).exp()
    }

    pub fn validate(&self) -> Result<(), SkewError> {
        if self.spot <= 0.0 || !self.spot.is_finite() {
            return Err(SkewError::invalid_input("Spot must be positive"));
        }
        if !self.rate.is_finite() || !self.dividend_yield.is_finite() {
            return Err(SkewError::invalid_input("Rates must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_parse_option_type() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("PUT".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!(" c ".parse::<OptionType>().unwrap(), OptionType::Call);
        assert!("straddle".parse::<OptionType>().is_err());
    }

    #[test]
    fn test_time_to_expiry() {
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

        let opt = OptionContract::new("SPY", 500.0, expiry, OptionType::Call);
        let tte = opt.time_to_expiry(today);

        // 151 days
        assert!((tte - 151.0 / 365.0).abs() < 1e-12);
        assert!(opt.time_to_expiry(expiry + chrono::Duration::days(1)) < 0.0);
    }

    #[test]
    fn test_otm_against_forward() {
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let call = OptionContract::new("SPY", 105.0, expiry, OptionType::Call);
        let put = OptionContract::new("SPY", 95.0, expiry, OptionType::Put);

        assert!(call.is_otm(100.0));
        assert!(put.is_otm(100.0));
        assert!(!call.is_otm(110.0));

        let atm_call = OptionContract::new("SPY", 100.0, expiry, OptionType::Call);
        let atm_put = OptionContract::new("SPY", 100.0, expiry, OptionType::Put);
        assert!(atm_call.is_otm(100.0));
        assert!(!atm_put.is_otm(100.0));
        assert!(call.log_moneyness(105.0).abs() < 1e-12);
    }

    #[test]
    fn test_market_params_forward() {
        let params = MarketParams::equity(100.0, 0.02, 0.03);
        // Dividend yield above rate puts the forward below spot
        assert!(params.forward(1.0) < 100.0);

        let fx = MarketParams::fx(145.0, 0.01, 0.0);
        assert_eq!(fx.rate, 0.01);
        assert!(fx.forward(0.5) > 145.0);

        assert!(MarketParams::equity(0.0, 0.01, 0.0).validate().is_err());
    }
}
