//! Validation and deduplication of ingested quotes

use crate::core::{OptionQuote, QuoteChain, QuoteSurface, STRIKE_TOLERANCE};

use super::{CleaningReport, DropReason, PreprocessConfig};

/// Quote cleaner
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            config: PreprocessConfig::default(),
        }
    }

    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Clean a surface, returning the kept quotes and a drop summary
    ///
    /// Chains left without quotes are removed from the output.
    pub fn clean(&self, surface: &QuoteSurface) -> (QuoteSurface, CleaningReport) {
        let mut report = CleaningReport::default();
        let mut cleaned = QuoteSurface::new(&surface.underlying, surface.spot, surface.valuation_date);

        for chain in &surface.chains {
            report.input += chain.len();

            let days = (chain.expiry - surface.valuation_date).num_days();
            if days < self.config.min_days_to_expiry {
                tracing::debug!("Dropping chain {} ({} days to expiry)", chain.expiry, days);
                for _ in 0..chain.len() {
                    report.record_drop(DropReason::Expired);
                }
                continue;
            }

            let kept = self.clean_chain(chain, &mut report);
            if !kept.is_empty() {
                report.kept += kept.len();
                cleaned.add_chain(kept);
            }
        }

        tracing::info!(
            "Preprocessed {}: kept {} of {} quotes",
            surface.underlying,
            report.kept,
            report.input
        );
        (cleaned, report)
    }

    fn clean_chain(&self, chain: &QuoteChain, report: &mut CleaningReport) -> QuoteChain {
        let mut out = QuoteChain::new(&chain.underlying, chain.expiry);

        for side in [&chain.calls, &chain.puts] {
            let mut sorted: Vec<&OptionQuote> = side.iter().collect();
            sorted.sort_by(|a, b| a.strike().total_cmp(&b.strike()));

            // (first strike of the group, best quote so far)
            let mut kept: Vec<(f64, &OptionQuote)> = Vec::new();

            for quote in sorted {
                if let Err(reason) = self.validate(quote) {
                    tracing::debug!(
                        "Dropping {} {} @ {}: {}",
                        quote.expiry(),
                        quote.option_type(),
                        quote.strike(),
                        reason.label()
                    );
                    report.record_drop(reason);
                    continue;
                }

                // Same grouping as the chain's strike lookups
                match kept.last_mut() {
                    Some((anchor, best)) if (quote.strike() - *anchor).abs() < STRIKE_TOLERANCE => {
                        report.record_drop(DropReason::Duplicate);
                        if spread_rank(quote) < spread_rank(*best) {
                            *best = quote;
                        }
                    }
                    _ => kept.push((quote.strike(), quote)),
                }
            }

            for (_, quote) in kept {
                out.add(quote.clone());
            }
        }
        out
    }

    /// Check a single quote against the configured thresholds
    pub fn validate(&self, quote: &OptionQuote) -> Result<(), DropReason> {
        let strike = quote.strike();
        if !strike.is_finite() || strike <= 0.0 {
            return Err(DropReason::NonPositiveStrike);
        }

        if quote.is_crossed() {
            return Err(DropReason::CrossedMarket);
        }

        let price = if self.config.require_two_sided {
            quote.mid()
        } else {
            quote.best_price()
        };
        let price = price.ok_or(DropReason::MissingPrice)?;

        if price < self.config.min_price {
            return Err(DropReason::BelowMinPrice);
        }

        if let Some(rel) = quote.relative_spread() {
            if rel > self.config.max_relative_spread {
                return Err(DropReason::WideSpread);
            }
        }

        Ok(())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower is better; one-sided quotes rank last
fn spread_rank(quote: &OptionQuote) -> f64 {
    quote.spread().unwrap_or(f64::INFINITY)
}
