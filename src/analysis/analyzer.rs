//! SkewAnalyzer - Main facade for the analysis pipeline
//!
//! Cleans a quote surface, solves a smile per expiry and measures it.

use ndarray::Array2;

use crate::config::AnalysisConfig;
use crate::core::{AnalyticsResult, QuoteSurface, SkewError, VolSurface, STRIKE_TOLERANCE};
use crate::preprocess::Preprocessor;

use super::{measure_skew, solve_chain, AnalysisReport, SkippedExpiry, TermPoint, VolSmile};

/// Runs preprocessing, IV solving and skew measurement
pub struct SkewAnalyzer {
    config: AnalysisConfig,
}

impl SkewAnalyzer {
    /// Create an analyzer with default configuration
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }

    /// Run the full pipeline on a raw quote surface
    ///
    /// Expiries where no strike could be solved are recorded in `skipped`. Fails when the
    /// surface has no usable quotes at all.
    pub fn analyze(&self, surface: &QuoteSurface) -> AnalyticsResult<AnalysisReport> {
        let market = self.config.market.params(surface.spot);
        market.validate()?;

        let preprocessor = Preprocessor::with_config(self.config.preprocess.clone());
        let (cleaned, cleaning) = preprocessor.clean(surface);
        if cleaned.chains.is_empty() {
            return Err(SkewError::data(format!(
                "No usable quotes for {} after cleaning ({} dropped)",
                surface.underlying,
                cleaning.total_dropped()
            )));
        }

        let (smiles, unsolved): (Vec<VolSmile>, Vec<VolSmile>) = cleaned
            .chains
            .iter()
            .map(|chain| {
                solve_chain(
                    chain,
                    &market,
                    cleaned.valuation_date,
                    self.config.smile.side,
                    &self.config.solver,
                )
            })
            .partition(|smile| !smile.is_empty());

        let skipped: Vec<SkippedExpiry> = unsolved
            .iter()
            .map(|smile| {
                tracing::warn!(
                    "Skipping {} {}: no strikes solved ({} failed)",
                    smile.underlying,
                    smile.expiry,
                    smile.failed
                );
                SkippedExpiry {
                    expiry: smile.expiry,
                    failed_solves: smile.failed,
                }
            })
            .collect();

        if smiles.is_empty() {
            return Err(SkewError::data(format!(
                "No implied volatilities could be solved for {}",
                surface.underlying
            )));
        }

        let results: Vec<_> = smiles.iter().map(|s| measure_skew(s, &self.config.smile)).collect();
        let term_structure = results.iter().map(TermPoint::from).collect();

        let vol_surface = if self.config.smile.build_surface {
            build_surface(&cleaned, &smiles)
        } else {
            None
        };

        tracing::info!(
            "Analyzed {}: {} expiries, {} implied vols",
            surface.underlying,
            results.len(),
            smiles.iter().map(|s| s.points.len()).sum::<usize>()
        );

        Ok(AnalysisReport {
            underlying: surface.underlying.clone(),
            spot: surface.spot,
            valuation_date: surface.valuation_date,
            market,
            results,
            skipped,
            term_structure,
            cleaning,
            surface: vol_surface,
        })
    }
}

impl Default for SkewAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze a surface with default settings
pub fn analyze_surface(surface: &QuoteSurface) -> AnalyticsResult<AnalysisReport> {
    SkewAnalyzer::new().analyze(surface)
}

/// Analyze a surface with a custom config
pub fn analyze_surface_with_config(
    surface: &QuoteSurface,
    config: AnalysisConfig,
) -> AnalyticsResult<AnalysisReport> {
    SkewAnalyzer::with_config(config).analyze(surface)
}

/// Implied vol grid over the union of solved strikes
///
/// Strikes missing from an expiry are filled along the strike axis. Needs at
/// least one smile.
pub fn build_surface(quotes: &QuoteSurface, smiles: &[VolSmile]) -> Option<VolSurface> {
    if smiles.is_empty() {
        return None;
    }

    let mut strikes: Vec<f64> = smiles.iter().flat_map(|s| s.points.iter().map(|p| p.strike)).collect();
    strikes.sort_by(|a, b| a.total_cmp(b));
    strikes.dedup_by(|a, b| (*a - *b).abs() < STRIKE_TOLERANCE);

    let mut vols = Array2::from_elem((strikes.len(), smiles.len()), f64::NAN);
    for (ti, smile) in smiles.iter().enumerate() {
        for (k, v) in smile.curve() {
            if let Some(si) = strikes.iter().position(|&s| (s - k).abs() < STRIKE_TOLERANCE) {
                vols[[si, ti]] = v;
            }
        }
    }
    fill_missing_vols(&strikes, &mut vols);

    Some(VolSurface::from_grid(
        &quotes.underlying,
        quotes.spot,
        quotes.valuation_date,
        strikes,
        smiles.iter().map(|s| s.time).collect(),
        smiles.iter().map(|s| s.expiry).collect(),
        vols,
        smiles.iter().map(|s| s.forward()).collect(),
    ))
}

/// Fill NaN cells per expiry column: linear in strike between solved
/// strikes, flat beyond the outermost ones
fn fill_missing_vols(strikes: &[f64], vols: &mut Array2<f64>) {
    let (n_strikes, n_times) = vols.dim();

    for ti in 0..n_times {
        let known: Vec<usize> = (0..n_strikes).filter(|&si| vols[[si, ti]].is_finite()).collect();
        let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
            continue;
        };

        for si in 0..first {
            vols[[si, ti]] = vols[[first, ti]];
        }
        for si in (last + 1)..n_strikes {
            vols[[si, ti]] = vols[[last, ti]];
        }

        for pair in known.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let (v_lo, v_hi) = (vols[[lo, ti]], vols[[hi, ti]]);
            let width = strikes[hi] - strikes[lo];
            for si in (lo + 1)..hi {
                let frac = (strikes[si] - strikes[lo]) / width;
                vols[[si, ti]] = v_lo + frac * (v_hi - v_lo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MarketParams, OptionContract, OptionQuote, OptionType, QuoteChain};
    use crate::models::black_scholes;
    use chrono::NaiveDate;

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    fn smile_vol(strike: f64, time: f64) -> f64 {
        let k = (strike / 100.0).ln();
        0.18 + 0.02 * time - 0.30 * k + 0.6 * k * k
    }

    /// Two expiries priced off a skewed smile with a small bid/ask around fair value
    fn synthetic_surface(market: &MarketParams) -> QuoteSurface {
        let mut surface = QuoteSurface::new("TEST", market.spot, valuation());

        for (expiry, step, max_strike) in [
            (NaiveDate::from_ymd_opt(2025, 2, 21).unwrap(), 5.0, 115.0),
            (NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(), 10.0, 120.0),
        ] {
            let time = crate::core::year_fraction(valuation(), expiry);
            let mut chain = QuoteChain::new("TEST", expiry);
            let mut strike = 80.0;
            while strike <= max_strike {
                for option_type in [OptionType::Call, OptionType::Put] {
                    let px = black_scholes::price(market, strike, smile_vol(strike, time), time, option_type);
                    let half_spread = (px * 0.02).max(0.005);
                    let contract = OptionContract::new("TEST", strike, expiry, option_type);
                    chain.add(OptionQuote::new(
                        contract,
                        Some(px - half_spread),
                        Some(px + half_spread),
                        None,
                    ));
                }
                strike += step;
            }
            surface.add_chain(chain);
        }
        surface
    }

    #[test]
    fn test_full_pipeline() {
        let config = AnalysisConfig::permissive();
        let market = config.market.params(100.0);
        let surface = synthetic_surface(&market);

        let report = SkewAnalyzer::with_config(config).analyze(&surface).unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.term_structure.len(), 2);
        assert!(report.term_structure[0].time < report.term_structure[1].time);

        for result in &report.results {
            let m = &result.metrics;
            assert!(m.slope.unwrap() < 0.0, "equity skew should slope down");
            assert!(m.risk_reversal.unwrap() < 0.0);
            assert!(m.put_call_skew.unwrap() > 0.0);
            assert!(result.call_greeks.is_some());
            assert_eq!(result.failed_solves, 0);
        }

        let grid = report.surface.as_ref().unwrap();
        // Union of 5-wide and 10-wide strikes
        assert_eq!(grid.strikes.len(), 9);
        assert!(grid.vols.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn test_surface_fill_between_expiries() {
        let config = AnalysisConfig::permissive();
        let market = config.market.params(100.0);
        let report = SkewAnalyzer::with_config(config).analyze(&synthetic_surface(&market)).unwrap();
        let grid = report.surface.unwrap();

        // 85 is only quoted on the front expiry; back column is interpolated
        let si = grid.strikes.iter().position(|&k| (k - 85.0).abs() < 1e-9).unwrap();
        let back = grid.vols[[si, 1]];
        let lo = grid.vols[[si - 1, 1]];
        let hi = grid.vols[[si + 1, 1]];
        assert!((back - (lo + hi) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_z_score_lookup() {
        let config = AnalysisConfig::permissive();
        let market = config.market.params(100.0);
        let report = SkewAnalyzer::with_config(config).analyze(&synthetic_surface(&market)).unwrap();

        // Low strikes carry the richest vols
        assert!(report.z_score(80.0, None).unwrap() > 1.0);
        let back = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        assert!(report.z_score(80.0, Some(back)).is_ok());
        assert!(report.z_score(85.0, Some(back)).is_err());
        assert!(report.z_score(80.0, Some(valuation())).is_err());
    }

    #[test]
    fn test_unsolvable_expiry_counted() {
        let config = AnalysisConfig::permissive();
        let market = config.market.params(100.0);
        let mut surface = synthetic_surface(&market);

        // Calls priced above spot cannot be inverted
        let bad_expiry = NaiveDate::from_ymd_opt(2025, 3, 21).unwrap();
        let mut chain = QuoteChain::new("TEST", bad_expiry);
        for strike in [95.0, 105.0] {
            chain.add(OptionQuote::new(
                OptionContract::new("TEST", strike, bad_expiry, OptionType::Call),
                Some(149.0),
                Some(151.0),
                None,
            ));
        }
        surface.add_chain(chain);

        let report = SkewAnalyzer::with_config(config).analyze(&surface).unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(report.result_for(bad_expiry).is_none());
        assert_eq!(
            report.skipped,
            vec![SkippedExpiry {
                expiry: bad_expiry,
                failed_solves: 2
            }]
        );
        assert_eq!(report.failed_solves(), 2);
    }

    #[test]
    fn test_empty_surface_is_error() {
        let surface = QuoteSurface::new("TEST", 100.0, valuation());
        assert!(matches!(analyze_surface(&surface), Err(SkewError::Data(_))));
    }

    #[test]
    fn test_bad_spot_is_error() {
        let surface = QuoteSurface::new("TEST", 0.0, valuation());
        assert!(matches!(analyze_surface(&surface), Err(SkewError::InvalidInput(_))));
    }

    #[test]
    fn test_fill_missing_vols() {
        let strikes = [90.0, 95.0, 100.0, 110.0, 120.0];
        let mut vols = Array2::from_elem((5, 1), f64::NAN);
        vols[[1, 0]] = 0.30;
        vols[[3, 0]] = 0.20;

        fill_missing_vols(&strikes, &mut vols);

        assert_eq!(vols[[0, 0]], 0.30);
        assert!((vols[[2, 0]] - (0.30 - 0.10 / 3.0)).abs() < 1e-12);
        assert_eq!(vols[[4, 0]], 0.20);
    }
}
