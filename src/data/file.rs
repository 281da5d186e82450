//! Local option chain files
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "symbol": "SPY",
//!   "spot": 500.0,
//!   "valuation_date": "2025-01-02",
//!   "chains": [
//!     { "expiry": "2025-03-21",
//!       "calls": [ { "strike": 500.0, "bid": 12.1, "ask": 12.4, "last": 12.3 } ],
//!       "puts":  [ { "strike": 480.0, "bid": 6.0, "ask": 6.2 } ] }
//!   ]
//! }
//! ```
//!
//! `valuation_date` defaults to today; `bid`, `ask` and `last` are optional.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    AnalyticsResult, OptionContract, OptionQuote, OptionType, QuoteChain, QuoteSurface, SkewError,
};

#[derive(Debug, Serialize, Deserialize)]
struct ChainFile {
    symbol: String,
    spot: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valuation_date: Option<NaiveDate>,
    chains: Vec<ChainData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChainData {
    expiry: NaiveDate,
    #[serde(default)]
    calls: Vec<OptionData>,
    #[serde(default)]
    puts: Vec<OptionData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OptionData {
    strike: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ask: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last: Option<f64>,
}

/// Load a quote surface from a JSON chain file
pub fn load_chain_file(path: impl AsRef<Path>) -> AnalyticsResult<QuoteSurface> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let file: ChainFile = serde_json::from_reader(reader)?;

    let surface = into_surface(file)?;
    tracing::info!(
        "Loaded {} quotes across {} expiries for {} from {:?}",
        surface.total_quotes(),
        surface.chains.len(),
        surface.underlying,
        path
    );
    Ok(surface)
}

/// Parse a quote surface from JSON text
pub fn parse_chain_json(json: &str) -> AnalyticsResult<QuoteSurface> {
    let file: ChainFile = serde_json::from_str(json)?;
    into_surface(file)
}

/// Serialize a quote surface into the chain file layout
pub fn to_chain_json(surface: &QuoteSurface) -> AnalyticsResult<String> {
    let to_data = |q: &OptionQuote| OptionData {
        strike: q.strike(),
        bid: q.bid(),
        ask: q.ask(),
        last: q.last(),
    };

    let file = ChainFile {
        symbol: surface.underlying.clone(),
        spot: surface.spot,
        valuation_date: Some(surface.valuation_date),
        chains: surface
            .chains
            .iter()
            .map(|c| ChainData {
                expiry: c.expiry,
                calls: c.calls.iter().map(to_data).collect(),
                puts: c.puts.iter().map(to_data).collect(),
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&file)?)
}

fn into_surface(file: ChainFile) -> AnalyticsResult<QuoteSurface> {
    if file.spot <= 0.0 || !file.spot.is_finite() {
        return Err(SkewError::data(format!(
            "Spot for {} must be positive, got {}",
            file.symbol, file.spot
        )));
    }

    let valuation_date = file
        .valuation_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let mut surface = QuoteSurface::new(&file.symbol, file.spot, valuation_date);

    for chain_data in file.chains {
        let mut chain = QuoteChain::new(&file.symbol, chain_data.expiry);
        let sides = [
            (OptionType::Call, chain_data.calls),
            (OptionType::Put, chain_data.puts),
        ];

        for (option_type, options) in sides {
            for data in options {
                let contract =
                    OptionContract::new(&file.symbol, data.strike, chain_data.expiry, option_type);
                let quote = OptionQuote::new(contract, data.bid, data.ask, data.last)
                    .with_underlying_price(file.spot);
                chain.add(quote);
            }
        }

        surface.add_chain(chain);
    }

    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "symbol": "SPY",
        "spot": 100.0,
        "valuation_date": "2025-01-02",
        "chains": [
            { "expiry": "2025-07-02",
              "calls": [ { "strike": 105.0, "bid": 3.0, "ask": 3.2 } ],
              "puts":  [ { "strike": 95.0, "bid": 2.5, "ask": 2.7, "last": 2.6 },
                         { "strike": 90.0, "last": 1.4 } ] },
            { "expiry": "2025-03-21", "puts": [ { "strike": 95.0, "bid": 1.0, "ask": 1.1 } ] }
        ]
    }"#;

    #[test]
    fn test_parse_chain_json() {
        let surface = parse_chain_json(SAMPLE).unwrap();

        assert_eq!(surface.underlying, "SPY");
        assert_eq!(surface.valuation_date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(surface.chains.len(), 2);
        // Sorted by expiry
        assert_eq!(surface.chains[0].expiry, NaiveDate::from_ymd_opt(2025, 3, 21).unwrap());

        let chain = &surface.chains[1];
        assert_eq!(chain.calls.len(), 1);
        assert_eq!(chain.puts[0].strike(), 90.0);
        assert_eq!(chain.puts[0].bid(), None);
        assert_eq!(chain.puts[0].last(), Some(1.4));
        assert_eq!(chain.puts[1].underlying_price(), Some(100.0));
    }

    #[test]
    fn test_load_chain_file_and_write_back() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let surface = load_chain_file(file.path()).unwrap();
        assert_eq!(surface.total_quotes(), 4);

        let json = to_chain_json(&surface).unwrap();
        let reparsed = parse_chain_json(&json).unwrap();
        assert_eq!(reparsed.total_quotes(), 4);
        assert_eq!(reparsed.valuation_date, surface.valuation_date);
    }

    #[test]
    fn test_rejects_bad_spot() {
        let json = r#"{ "symbol": "X", "spot": 0.0, "chains": [] }"#;
        assert!(matches!(parse_chain_json(json), Err(SkewError::Data(_))));
        assert!(matches!(parse_chain_json("{"), Err(SkewError::Serialization(_))));
    }
}
