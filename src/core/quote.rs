//! Option quote data
//!
//! Market quotes as ingested. A quote is immutable once built; mid and spread
//! are derived on demand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::option::{year_fraction, OptionContract, OptionType};

/// Strike matching tolerance for chain lookups
pub const STRIKE_TOLERANCE: f64 = 1e-4;

/// Option market quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    contract: OptionContract,
    bid: Option<f64>,
    ask: Option<f64>,
    last: Option<f64>,
    underlying_price: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl OptionQuote {
    pub fn new(
        contract: OptionContract,
        bid: Option<f64>,
        ask: Option<f64>,
        last: Option<f64>,
    ) -> Self {
        Self {
            contract,
            bid,
            ask,
            last,
            underlying_price: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the underlying price observed with the quote
    pub fn with_underlying_price(mut self, price: f64) -> Self {
        self.underlying_price = Some(price);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn contract(&self) -> &OptionContract {
        &self.contract
    }

    pub fn underlying(&self) -> &str {
        &self.contract.underlying
    }

    pub fn strike(&self) -> f64 {
        self.contract.strike
    }

    pub fn expiry(&self) -> NaiveDate {
        self.contract.expiry
    }

    pub fn option_type(&self) -> OptionType {
        self.contract.option_type
    }

    pub fn bid(&self) -> Option<f64> {
        self.bid
    }

    pub fn ask(&self) -> Option<f64> {
        self.ask
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn underlying_price(&self) -> Option<f64> {
        self.underlying_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Mid price, only for a two-sided market with positive prices
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) if b > 0.0 && a > 0.0 => Some((b + a) / 2.0),
            _ => None,
        }
    }

    /// Get the best available price (mid > last > bid)
    pub fn best_price(&self) -> Option<f64> {
        self.mid()
            .or(self.last.filter(|p| *p > 0.0))
            .or(self.bid.filter(|p| *p > 0.0))
    }

    /// Bid-ask spread
    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some(a - b),
            _ => None,
        }
    }

    /// Relative spread (spread / mid)
    pub fn relative_spread(&self) -> Option<f64> {
        match (self.spread(), self.mid()) {
            (Some(s), Some(m)) if m > 0.0 => Some(s / m),
            _ => None,
        }
    }

    /// Bid above ask
    pub fn is_crossed(&self) -> bool {
        matches!((self.bid, self.ask), (Some(b), Some(a)) if b > a)
    }
}

/// Chain of quotes for a single expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteChain {
    /// Underlying symbol
    pub underlying: String,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Call quotes sorted by strike
    pub calls: Vec<OptionQuote>,
    /// Put quotes sorted by strike
    pub puts: Vec<OptionQuote>,
}

impl QuoteChain {
    pub fn new(underlying: impl Into<String>, expiry: NaiveDate) -> Self {
        Self {
            underlying: underlying.into(),
            expiry,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// Add a quote to the call or put side
    pub fn add(&mut self, quote: OptionQuote) {
        let side = match quote.option_type() {
            OptionType::Call => &mut self.calls,
            OptionType::Put => &mut self.puts,
        };
        side.push(quote);
        side.sort_by(|a, b| a.strike().total_cmp(&b.strike()));
    }

    /// Time to expiry in years from the valuation date
    pub fn time_to_expiry(&self, valuation_date: NaiveDate) -> f64 {
        year_fraction(valuation_date, self.expiry)
    }

    /// Get all strikes (either side), sorted and deduplicated
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self
            .calls
            .iter()
            .chain(self.puts.iter())
            .map(|q| q.strike())
            .collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup_by(|a, b| (*a - *b).abs() < STRIKE_TOLERANCE);
        strikes
    }

    /// Strike closest to a reference level (usually the forward)
    pub fn atm_strike(&self, reference: f64) -> Option<f64> {
        self.strikes()
            .into_iter()
            .min_by(|a, b| (reference - a).abs().total_cmp(&(reference - b).abs()))
    }

    pub fn call_at(&self, strike: f64) -> Option<&OptionQuote> {
        self.calls
            .iter()
            .find(|q| (q.strike() - strike).abs() < STRIKE_TOLERANCE)
    }

    pub fn put_at(&self, strike: f64) -> Option<&OptionQuote> {
        self.puts
            .iter()
            .find(|q| (q.strike() - strike).abs() < STRIKE_TOLERANCE)
    }

    pub fn quote_at(&self, strike: f64, option_type: OptionType) -> Option<&OptionQuote> {
        match option_type {
            OptionType::Call => self.call_at(strike),
            OptionType::Put => self.put_at(strike),
        }
    }

    /// All quotes, calls first
    pub fn quotes(&self) -> impl Iterator<Item = &OptionQuote> {
        self.calls.iter().chain(self.puts.iter())
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

/// Full quote surface (all expiries) for one underlying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSurface {
    /// Underlying symbol
    pub underlying: String,
    /// Spot price
    pub spot: f64,
    /// Date the quotes are valued at
    pub valuation_date: NaiveDate,
    /// Quote chains sorted by expiry
    pub chains: Vec<QuoteChain>,
}

impl QuoteSurface {
    pub fn new(underlying: impl Into<String>, spot: f64, valuation_date: NaiveDate) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            valuation_date,
            chains: Vec::new(),
        }
    }

    /// Add a chain; a chain for an existing expiry is merged into it
    pub fn add_chain(&mut self, chain: QuoteChain) {
        if let Some(existing) = self.chains.iter_mut().find(|c| c.expiry == chain.expiry) {
            for quote in chain.calls.into_iter().chain(chain.puts) {
                existing.add(quote);
            }
            return;
        }
        self.chains.push(chain);
        self.chains.sort_by_key(|c| c.expiry);
    }

    /// All expiries
    pub fn expiries(&self) -> Vec<NaiveDate> {
        self.chains.iter().map(|c| c.expiry).collect()
    }

    /// Get chain for expiry
    pub fn chain_for_expiry(&self, expiry: NaiveDate) -> Option<&QuoteChain> {
        self.chains.iter().find(|c| c.expiry == expiry)
    }

    /// Total number of quotes
    pub fn total_quotes(&self) -> usize {
        self.chains.iter().map(|c| c.len()).sum()
    }
}
