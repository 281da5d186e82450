//! Black-Scholes-Merton Model
//!
//! Provides:
//! - European option pricing with a continuous dividend (or foreign) yield
//! - Greeks computation
//! - Implied volatility solver (Newton-Raphson with bisection fallback)

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::core::{AnalyticsResult, Greeks, MarketParams, OptionType, SkewError};

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 and d2 parameters
pub fn d1_d2(params: &MarketParams, strike: f64, vol: f64, time: f64) -> (f64, f64) {
    let forward = params.forward(time);
    let vol_sqrt_t = vol * time.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * vol * vol * time) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Black-Scholes-Merton European option price
pub fn price(
    params: &MarketParams,
    strike: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    if time <= 0.0 {
        return option_type.intrinsic(params.spot, strike);
    }

    let df = params.discount(time);
    let forward = params.forward(time);

    if vol <= 0.0 {
        // Zero vol = discounted intrinsic on the forward
        return df * option_type.intrinsic(forward, strike);
    }

    let (d1, d2) = d1_d2(params, strike, vol, time);

    match option_type {
        OptionType::Call => df * (forward * norm_cdf(d1) - strike * norm_cdf(d2)),
        OptionType::Put => df * (strike * norm_cdf(-d2) - forward * norm_cdf(-d1)),
    }
}

/// Spot delta only
pub fn delta(
    params: &MarketParams,
    strike: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    if time <= 0.0 || vol <= 0.0 {
        return step_delta(params.spot, strike, option_type);
    }
    let (d1, _) = d1_d2(params, strike, vol, time);
    let div_factor = (-params.dividend_yield * time).exp();
    match option_type {
        OptionType::Call => div_factor * norm_cdf(d1),
        OptionType::Put => div_factor * (norm_cdf(d1) - 1.0),
    }
}

fn step_delta(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call if spot > strike => 1.0,
        OptionType::Put if spot < strike => -1.0,
        _ => 0.0,
    }
}

/// Black-Scholes-Merton Greeks
pub fn greeks(
    params: &MarketParams,
    strike: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> Greeks {
    if time <= 0.0 || vol <= 0.0 {
        // At expiry or zero vol
        return Greeks::new(step_delta(params.spot, strike, option_type), 0.0, 0.0, 0.0, 0.0);
    }

    let spot = params.spot;
    let rate = params.rate;
    let div = params.dividend_yield;

    let (d1, d2) = d1_d2(params, strike, vol, time);
    let df = params.discount(time);
    let sqrt_t = time.sqrt();
    let pdf_d1 = norm_pdf(d1);
    let div_factor = (-div * time).exp();

    let delta = match option_type {
        OptionType::Call => div_factor * norm_cdf(d1),
        OptionType::Put => div_factor * (norm_cdf(d1) - 1.0),
    };

    // Same for call and put
    let gamma = div_factor * pdf_d1 / (spot * vol * sqrt_t);

    // Per 1% vol move
    let vega = spot * div_factor * pdf_d1 * sqrt_t / 100.0;

    let term1 = -spot * div_factor * pdf_d1 * vol / (2.0 * sqrt_t);
    let theta = match option_type {
        OptionType::Call => {
            term1 - rate * strike * df * norm_cdf(d2) + div * spot * div_factor * norm_cdf(d1)
        }
        OptionType::Put => {
            term1 + rate * strike * df * norm_cdf(-d2) - div * spot * div_factor * norm_cdf(-d1)
        }
    };
    let theta_per_day = theta / 365.0;

    // Per 1% rate move
    let rho = match option_type {
        OptionType::Call => strike * time * df * norm_cdf(d2) / 100.0,
        OptionType::Put => -strike * time * df * norm_cdf(-d2) / 100.0,
    };

    let mut greeks = Greeks::new(delta, gamma, theta_per_day, vega, rho);

    // Vanna: d(delta)/d(vol) = d(vega)/d(spot)
    greeks.vanna = Some(-div_factor * pdf_d1 * d2 / vol);

    // Volga: d(vega)/d(vol), vega in per-point units
    greeks.volga = Some(vega * d1 * d2 / vol);

    greeks
}

/// Implied volatility solver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Price tolerance for convergence
    pub tolerance: f64,
    /// Maximum iterations per method
    pub max_iterations: usize,
    /// Lower volatility bound
    pub min_vol: f64,
    /// Upper volatility bound
    pub max_vol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
            min_vol: 0.001,
            max_vol: 5.0,
        }
    }
}

/// Implied volatility with default solver settings
pub fn implied_volatility(
    market_price: f64,
    params: &MarketParams,
    strike: f64,
    time: f64,
    option_type: OptionType,
) -> AnalyticsResult<f64> {
    implied_volatility_with(
        market_price,
        params,
        strike,
        time,
        option_type,
        &SolverConfig::default(),
    )
}

/// Implied volatility solver using Newton-Raphson with bisection fallback
pub fn implied_volatility_with(
    market_price: f64,
    params: &MarketParams,
    strike: f64,
    time: f64,
    option_type: OptionType,
    config: &SolverConfig,
) -> AnalyticsResult<f64> {
    if !market_price.is_finite() || market_price <= 0.0 {
        return Err(SkewError::numerical("Non-positive option price"));
    }
    if time <= 0.0 {
        return Err(SkewError::numerical("Non-positive time to expiry"));
    }
    if params.spot <= 0.0 || strike <= 0.0 {
        return Err(SkewError::numerical("Non-positive spot or strike"));
    }

    // No-arbitrage bounds
    let df = params.discount(time);
    let fwd_pv = params.spot * (-params.dividend_yield * time).exp();
    let strike_pv = strike * df;
    let (lower, upper) = match option_type {
        OptionType::Call => ((fwd_pv - strike_pv).max(0.0), fwd_pv),
        OptionType::Put => ((strike_pv - fwd_pv).max(0.0), strike_pv),
    };

    if market_price < lower - config.tolerance {
        return Err(SkewError::numerical("Price below intrinsic value"));
    }
    if market_price >= upper {
        return Err(SkewError::numerical("Price above no-arbitrage upper bound"));
    }

    // Initial guess using Brenner-Subrahmanyam approximation
    let atm_approx = market_price / (0.4 * params.spot * time.sqrt());
    let mut vol = atm_approx.clamp(0.01, 3.0);

    for _ in 0..config.max_iterations {
        let diff = price(params, strike, vol, time, option_type) - market_price;

        if diff.abs() < config.tolerance {
            return Ok(vol);
        }

        let (d1, _) = d1_d2(params, strike, vol, time);
        let vega = fwd_pv * norm_pdf(d1) * time.sqrt();

        if vega.abs() < 1e-12 {
            break; // Vega too small, switch to bisection
        }

        let new_vol = vol - diff / vega;

        if new_vol <= config.min_vol || new_vol > config.max_vol {
            break; // Out of bounds, switch to bisection
        }

        vol = new_vol;
    }

    bisection_iv(market_price, params, strike, time, option_type, config)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    market_price: f64,
    params: &MarketParams,
    strike: f64,
    time: f64,
    option_type: OptionType,
    config: &SolverConfig,
) -> AnalyticsResult<f64> {
    let mut low = config.min_vol;
    let mut high = config.max_vol;

    if price(params, strike, high, time, option_type) < market_price {
        return Err(SkewError::numerical("Implied vol above solver bound"));
    }
    if price(params, strike, low, time, option_type) > market_price + config.tolerance {
        return Err(SkewError::numerical("Implied vol below solver bound"));
    }

    for _ in 0..config.max_iterations {
        let mid = (low + high) / 2.0;
        let diff = price(params, strike, mid, time, option_type) - market_price;

        if diff.abs() < config.tolerance || (high - low) < config.tolerance {
            return Ok(mid);
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(SkewError::numerical("IV solver did not converge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate
        let params = MarketParams::equity(100.0, 0.05, 0.0);
        let call_price = price(&params, 100.0, 0.20, 1.0, OptionType::Call);

        // 10.4506 for these parameters
        assert!((call_price - 10.4506).abs() < 1e-3);

        let put_price = price(&params, 100.0, 0.20, 1.0, OptionType::Put);
        assert!((put_price - 5.5735).abs() < 1e-3);
    }

    #[test]
    fn test_put_call_parity_with_dividend() {
        let params = MarketParams::equity(100.0, 0.02, 0.03);
        let (k, t) = (95.0, 1.0);

        let call = price(&params, k, 0.2, t, OptionType::Call);
        let put = price(&params, k, 0.2, t, OptionType::Put);

        // C - P = S e^{-qT} - K e^{-rT}
        let rhs = 100.0 * (-0.03f64).exp() - k * (-0.02f64).exp();
        assert!((call - put - rhs).abs() < 1e-10);
    }

    #[test]
    fn test_greeks() {
        let params = MarketParams::equity(100.0, 0.05, 0.0);
        let g = greeks(&params, 100.0, 0.20, 1.0, OptionType::Call);

        assert!(g.delta > 0.5 && g.delta < 0.7);
        assert!(g.gamma > 0.0);
        assert!(g.theta < 0.0);
        assert!(g.vega > 0.0);
        assert!(g.rho > 0.0);

        let p = greeks(&params, 100.0, 0.20, 1.0, OptionType::Put);
        assert!(p.delta < 0.0 && p.delta > -0.5);
        assert!((p.gamma - g.gamma).abs() < 1e-12);
        assert!((p.vega - g.vega).abs() < 1e-12);
        assert!(p.rho < 0.0);
    }

    #[test]
    fn test_greeks_against_finite_differences() {
        let params = MarketParams::equity(100.0, 0.02, 0.03);
        let (k, vol, t) = (95.0, 0.2, 1.0);
        let g = greeks(&params, k, vol, t, OptionType::Put);

        let h = 0.01;
        let up = MarketParams { spot: 100.0 + h, ..params };
        let dn = MarketParams { spot: 100.0 - h, ..params };
        let p0 = price(&params, k, vol, t, OptionType::Put);
        let pu = price(&up, k, vol, t, OptionType::Put);
        let pd = price(&dn, k, vol, t, OptionType::Put);

        assert!((g.delta - (pu - pd) / (2.0 * h)).abs() < 1e-5);
        assert!((g.gamma - (pu - 2.0 * p0 + pd) / (h * h)).abs() < 1e-5);
        // Gamma carries the e^{-qT} factor: n(d1) e^{-qT} / (S σ √T)
        assert!((g.gamma - 0.018470).abs() < 1e-6);

        let vega_fd = (price(&params, k, vol + 0.01, t, OptionType::Put)
            - price(&params, k, vol - 0.01, t, OptionType::Put))
            / 2.0;
        assert!((g.vega - vega_fd).abs() < 1e-3);

        assert!((g.delta - delta(&params, k, vol, t, OptionType::Put)).abs() < 1e-12);
    }

    #[test]
    fn test_expired_option() {
        let params = MarketParams::equity(100.0, 0.05, 0.0);
        assert_eq!(price(&params, 90.0, 0.2, 0.0, OptionType::Call), 10.0);
        let g = greeks(&params, 90.0, 0.2, 0.0, OptionType::Call);
        assert_eq!(g.delta, 1.0);
        assert_eq!(g.gamma, 0.0);
    }

    #[test]
    fn test_implied_vol() {
        let params = MarketParams::equity(100.0, 0.05, 0.0);
        let (strike, vol, time) = (100.0, 0.25, 0.5);

        let market_price = price(&params, strike, vol, time, OptionType::Call);
        let iv = implied_volatility(market_price, &params, strike, time, OptionType::Call).unwrap();

        assert!((iv - vol).abs() < 0.0001);
    }

    #[test]
    fn test_iv_otm_and_itm() {
        let params = MarketParams::equity(100.0, 0.05, 0.01);

        for (strike, option_type, vol) in [
            (90.0, OptionType::Put, 0.30),
            (110.0, OptionType::Call, 0.18),
            (120.0, OptionType::Put, 0.22),
            (80.0, OptionType::Call, 0.35),
        ] {
            let market_price = price(&params, strike, vol, 0.25, option_type);
            let iv = implied_volatility(market_price, &params, strike, 0.25, option_type).unwrap();
            assert!((iv - vol).abs() < 1e-4, "strike {} {}: {}", strike, option_type, iv);
        }
    }

    #[test]
    fn test_iv_rejects_arbitrage() {
        let params = MarketParams::equity(100.0, 0.05, 0.0);

        // Deep ITM call below intrinsic
        assert!(implied_volatility(5.0, &params, 80.0, 0.5, OptionType::Call).is_err());
        // Call worth more than the underlying
        assert!(implied_volatility(101.0, &params, 100.0, 0.5, OptionType::Call).is_err());
        assert!(implied_volatility(0.0, &params, 100.0, 0.5, OptionType::Call).is_err());
        assert!(implied_volatility(5.0, &params, 100.0, 0.0, OptionType::Call).is_err());
    }
}
