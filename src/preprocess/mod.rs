//! Quote Preprocessing
//!
//! Cleans ingested chains before implied volatility solving:
//! - **Validation**: drops quotes with no usable price, crossed or wide
//!   markets, non-positive strikes and expired contracts
//! - **Deduplication**: one quote per (expiry, type, strike), keeping the
//!   tightest market

mod clean;
mod config;

pub use clean::*;
pub use config::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Why a quote was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// No positive bid/ask mid, last or bid
    MissingPrice,
    /// Strike is zero, negative or not finite
    NonPositiveStrike,
    /// Bid above ask
    CrossedMarket,
    /// Relative spread above the configured limit
    WideSpread,
    /// Best price below the configured minimum
    BelowMinPrice,
    /// Too close to (or past) expiry
    Expired,
    /// Duplicate of a tighter quote at the same strike and expiry
    Duplicate,
}

impl DropReason {
    pub fn label(&self) -> &'static str {
        match self {
            DropReason::MissingPrice => "missing price",
            DropReason::NonPositiveStrike => "non-positive strike",
            DropReason::CrossedMarket => "crossed market",
            DropReason::WideSpread => "wide spread",
            DropReason::BelowMinPrice => "below min price",
            DropReason::Expired => "expired",
            DropReason::Duplicate => "duplicate",
        }
    }
}

/// Summary of a cleaning pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Quotes seen
    pub input: usize,
    /// Quotes kept
    pub kept: usize,
    /// Drop counts by reason
    pub dropped: BTreeMap<DropReason, usize>,
}

impl CleaningReport {
    pub fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }
}
