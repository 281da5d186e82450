//! Per-expiry volatility smile
//!
//! Solves implied volatility for each strike of a chain and provides
//! interpolation by strike, moneyness and delta.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    find_bracket, ImpliedVolatilityPoint, MarketParams, OptionQuote, OptionType, QuoteChain,
    STRIKE_TOLERANCE,
};
use crate::models::black_scholes::{self, SolverConfig};

use super::SmileSide;

/// Implied volatility smile for one expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolSmile {
    /// Underlying symbol
    pub underlying: String,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Time to expiry in years
    pub time: f64,
    /// Market inputs used for the solve
    pub params: MarketParams,
    /// Solved points sorted by strike
    pub points: Vec<ImpliedVolatilityPoint>,
    /// Quotes whose solve failed
    pub failed: usize,
}

/// Solve a chain into a smile
///
/// Strikes whose price cannot be inverted are skipped and counted in `failed`.
pub fn solve_chain(
    chain: &QuoteChain,
    params: &MarketParams,
    valuation_date: NaiveDate,
    side: SmileSide,
    solver: &SolverConfig,
) -> VolSmile {
    let time = chain.time_to_expiry(valuation_date);
    let forward = params.forward(time);

    let mut points = Vec::new();
    let mut failed = 0;

    for strike in chain.strikes() {
        for quote in select_quotes(chain, strike, forward, side) {
            match solve_quote(quote, params, time, forward, solver) {
                Some(point) => points.push(point),
                None => failed += 1,
            }
        }
    }

    points.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    VolSmile {
        underlying: chain.underlying.clone(),
        expiry: chain.expiry,
        time,
        params: *params,
        points,
        failed,
    }
}

fn select_quotes(chain: &QuoteChain, strike: f64, forward: f64, side: SmileSide) -> Vec<&OptionQuote> {
    match side {
        SmileSide::Calls => chain.call_at(strike).into_iter().collect(),
        SmileSide::Puts => chain.put_at(strike).into_iter().collect(),
        SmileSide::Both => chain.call_at(strike).into_iter().chain(chain.put_at(strike)).collect(),
        SmileSide::OutOfTheMoney => {
            // ITM side only when the OTM quote is missing
            let (call, put) = (chain.call_at(strike), chain.put_at(strike));
            let (otm, itm) = match call {
                Some(c) if !c.contract().is_otm(forward) => (put, call),
                Some(_) => (call, put),
                None => (put, None),
            };
            otm.or(itm).into_iter().collect()
        }
    }
}

fn solve_quote(
    quote: &OptionQuote,
    params: &MarketParams,
    time: f64,
    forward: f64,
    solver: &SolverConfig,
) -> Option<ImpliedVolatilityPoint> {
    let strike = quote.strike();
    let option_type = quote.option_type();
    let price = quote.best_price()?;

    match black_scholes::implied_volatility_with(price, params, strike, time, option_type, solver) {
        Ok(iv) => Some(ImpliedVolatilityPoint {
            strike,
            implied_vol: iv,
            option_type,
            price,
            log_moneyness: (strike / forward).ln(),
            delta: black_scholes::delta(params, strike, iv, time, option_type),
        }),
        Err(e) => {
            tracing::debug!("IV solve failed for {} {} @ {}: {}", quote.expiry(), option_type, strike, e);
            None
        }
    }
}

impl VolSmile {
    /// Forward for this expiry
    pub fn forward(&self) -> f64 {
        self.params.forward(self.time)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (strike, vol) pairs with one vol per strike; shared strikes are averaged
    pub fn curve(&self) -> Vec<(f64, f64)> {
        let mut curve: Vec<(f64, f64, usize)> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            match curve.last_mut() {
                Some((k, v, n)) if (*k - p.strike).abs() < STRIKE_TOLERANCE => {
                    *v += p.implied_vol;
                    *n += 1;
                }
                _ => curve.push((p.strike, p.implied_vol, 1)),
            }
        }
        curve.into_iter().map(|(k, v, n)| (k, v / n as f64)).collect()
    }

    /// Linear interpolation in strike, flat outside the quoted range
    pub fn vol_at_strike(&self, strike: f64) -> Option<f64> {
        let curve = self.curve();
        let strikes: Vec<f64> = curve.iter().map(|(k, _)| *k).collect();
        let (lo, hi, frac) = find_bracket(&strikes, strike)?;
        Some(curve[lo].1 * (1.0 - frac) + curve[hi].1 * frac)
    }

    /// Vol at log-moneyness ln(K/F)
    pub fn vol_at_log_moneyness(&self, log_moneyness: f64) -> Option<f64> {
        self.vol_at_strike(self.forward() * log_moneyness.exp())
    }

    /// At-the-forward volatility
    pub fn atm_vol(&self) -> Option<f64> {
        self.vol_at_strike(self.forward())
    }

    /// Whether `strike` lies inside the quoted strike range
    pub fn covers(&self, strike: f64) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(lo), Some(hi)) => strike >= lo.strike && strike <= hi.strike,
            _ => false,
        }
    }

    /// Vol where the `option_type` delta equals `target`
    ///
    /// Deltas are evaluated at each strike's own vol and are decreasing in
    /// strike; `None` when the target is not bracketed by the quoted strikes.
    pub fn vol_at_delta(&self, target: f64, option_type: OptionType) -> Option<f64> {
        let deltas: Vec<(f64, f64)> = self
            .curve()
            .into_iter()
            .map(|(k, v)| {
                (black_scholes::delta(&self.params, k, v, self.time, option_type), v)
            })
            .collect();

        deltas.windows(2).find_map(|w| {
            let ((d0, v0), (d1, v1)) = (w[0], w[1]);
            if (d0 - target) * (d1 - target) > 0.0 || (d0 - d1).abs() < 1e-12 {
                return None;
            }
            let frac = (target - d0) / (d1 - d0);
            Some(v0 + frac * (v1 - v0))
        })
    }

    /// Chain strike closest to the forward
    pub fn atm_strike(&self) -> Option<f64> {
        let forward = self.forward();
        self.points
            .iter()
            .map(|p| p.strike)
            .min_by(|a, b| (a - forward).abs().total_cmp(&(b - forward).abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OptionContract, QuoteChain};

    fn skewed_vol(strike: f64) -> f64 {
        // Downward sloping smile with mild convexity
        let k = (strike / 100.0).ln();
        0.20 - 0.25 * k + 0.8 * k * k
    }

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    /// Chain priced from a known smile, both sides at every strike
    fn synthetic_chain(params: &MarketParams) -> QuoteChain {
        let expiry = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let time = crate::core::year_fraction(valuation(), expiry);
        let mut chain = QuoteChain::new("TEST", expiry);

        for i in 0..13 {
            let strike = 70.0 + 5.0 * i as f64;
            for option_type in [OptionType::Call, OptionType::Put] {
                let px = black_scholes::price(params, strike, skewed_vol(strike), time, option_type);
                let contract = OptionContract::new("TEST", strike, expiry, option_type);
                chain.add(OptionQuote::new(contract, None, None, Some(px)));
            }
        }
        chain
    }

    #[test]
    fn test_solve_chain_recovers_smile() {
        let params = MarketParams::equity(100.0, 0.0, 0.0);
        let chain = synthetic_chain(&params);

        let smile = solve_chain(&chain, &params, valuation(), SmileSide::OutOfTheMoney, &SolverConfig::default());

        assert_eq!(smile.points.len(), 13);
        assert_eq!(smile.failed, 0);
        for p in &smile.points {
            assert!((p.implied_vol - skewed_vol(p.strike)).abs() < 1e-5);
            // OTM selection with F = 100
            if p.strike < 100.0 {
                assert_eq!(p.option_type, OptionType::Put);
            } else {
                assert_eq!(p.option_type, OptionType::Call);
            }
        }
    }

    #[test]
    fn test_both_sides_average_on_curve() {
        let params = MarketParams::equity(100.0, 0.0, 0.0);
        let chain = synthetic_chain(&params);

        let smile = solve_chain(&chain, &params, valuation(), SmileSide::Both, &SolverConfig::default());

        assert_eq!(smile.points.len(), 26);
        assert_eq!(smile.curve().len(), 13);
    }

    #[test]
    fn test_interpolation_and_delta_lookup() {
        let params = MarketParams::equity(100.0, 0.0, 0.0);
        let chain = synthetic_chain(&params);
        let smile = solve_chain(&chain, &params, valuation(), SmileSide::OutOfTheMoney, &SolverConfig::default());

        let atm = smile.atm_vol().unwrap();
        assert!((atm - 0.20).abs() < 1e-4);
        assert_eq!(smile.atm_strike(), Some(100.0));

        let mid = smile.vol_at_strike(92.5).unwrap();
        assert!((mid - (skewed_vol(90.0) + skewed_vol(95.0)) / 2.0).abs() < 1e-5);

        let put_25 = smile.vol_at_delta(-0.25, OptionType::Put).unwrap();
        let call_25 = smile.vol_at_delta(0.25, OptionType::Call).unwrap();
        // Put wing richer than call wing
        assert!(put_25 > call_25);

        assert!(smile.vol_at_delta(0.999, OptionType::Call).is_none());
    }

    #[test]
    fn test_missing_otm_quote_falls_back_to_itm() {
        let params = MarketParams::equity(100.0, 0.0, 0.0);
        let mut chain = synthetic_chain(&params);
        chain.puts.retain(|q| (q.strike() - 90.0).abs() > 1e-9);
        chain.calls.retain(|q| (q.strike() - 110.0).abs() > 1e-9);

        let smile = solve_chain(&chain, &params, valuation(), SmileSide::OutOfTheMoney, &SolverConfig::default());
        assert_eq!(smile.points.len(), 13);

        let at = |strike: f64| smile.points.iter().find(|p| (p.strike - strike).abs() < 1e-9).unwrap();
        assert_eq!(at(90.0).option_type, OptionType::Call);
        assert_eq!(at(110.0).option_type, OptionType::Put);
        assert_eq!(at(95.0).option_type, OptionType::Put);
        // Both sides imply the same vol
        assert!((at(90.0).implied_vol - skewed_vol(90.0)).abs() < 1e-5);
        assert!((at(110.0).implied_vol - skewed_vol(110.0)).abs() < 1e-5);
    }

    #[test]
    fn test_log_moneyness_lookup() {
        let params = MarketParams::equity(100.0, 0.03, 0.01);
        let chain = synthetic_chain(&params);
        let smile = solve_chain(&chain, &params, valuation(), SmileSide::OutOfTheMoney, &SolverConfig::default());
        let forward = smile.forward();
        assert!(forward > 100.0);

        for strike in [85.0, 100.0, 115.0] {
            let k = (strike / forward).ln();
            assert!((smile.vol_at_log_moneyness(k).unwrap() - smile.vol_at_strike(strike).unwrap()).abs() < 1e-12);
            assert!((smile.vol_at_log_moneyness(k).unwrap() - skewed_vol(strike)).abs() < 1e-5);
        }
        assert!((smile.vol_at_log_moneyness(0.0).unwrap() - smile.atm_vol().unwrap()).abs() < 1e-12);

        let point = smile.points.iter().find(|p| p.strike == 85.0).unwrap();
        assert!((point.log_moneyness - (85.0 / forward).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_unsolvable_quotes_are_counted() {
        let params = MarketParams::equity(100.0, 0.0, 0.0);
        let expiry = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let mut chain = QuoteChain::new("TEST", expiry);
        // Call priced above the underlying
        chain.add(OptionQuote::new(
            OptionContract::new("TEST", 100.0, expiry, OptionType::Call),
            None,
            None,
            Some(150.0),
        ));

        let smile = solve_chain(&chain, &params, valuation(), SmileSide::Calls, &SolverConfig::default());
        assert!(smile.is_empty());
        assert_eq!(smile.failed, 1);
        assert!(smile.atm_vol().is_none());
    }
}
