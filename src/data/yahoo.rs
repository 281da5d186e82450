//! Yahoo Finance chain source
//!
//! Pulls every listed expiry for a symbol from the unofficial v7 options
//! endpoint. Quotes are delayed (~15 min); strikes without a strike price are
//! skipped, and an expiry that fails to download is logged and left out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    AnalyticsResult, OptionContract, OptionQuote, OptionType, QuoteChain, QuoteSurface, SkewError,
};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance";

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> AnalyticsResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a different endpoint (mirrors, test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> AnalyticsResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SkewError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AnalyticsResult<T> {
        tracing::debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SkewError::network(e.to_string()))?
            .json()
            .map_err(|e| SkewError::data(format!("Failed to parse response: {}", e)))
    }

    /// Get current quote for a symbol
    pub fn get_quote(&self, symbol: &str) -> AnalyticsResult<SpotQuote> {
        let url = format!("{}/quote?symbols={}", self.base_url, symbol);
        let response: YahooQuoteResponse = self.get_json(&url)?;

        let result = response
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| SkewError::data("No quote data returned"))?;

        Ok(SpotQuote {
            symbol: symbol.to_string(),
            price: result.regular_market_price,
            bid: result.bid,
            ask: result.ask,
            timestamp: Utc::now(),
        })
    }

    /// Get available option expiration dates
    pub fn get_expirations(&self, symbol: &str) -> AnalyticsResult<Vec<NaiveDate>> {
        let url = format!("{}/options/{}", self.base_url, symbol);
        let response: YahooOptionsResponse = self.get_json(&url)?;

        let chain = first_result(response)?;
        Ok(chain
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect())
    }

    /// Get option chain for a specific expiration, with the spot it was quoted against
    pub fn get_option_chain(&self, symbol: &str, expiry: NaiveDate) -> AnalyticsResult<(f64, QuoteChain)> {
        let expiry_ts = expiry
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| SkewError::invalid_input(format!("Bad expiry {}", expiry)))?;

        let url = format!("{}/options/{}?date={}", self.base_url, symbol, expiry_ts);
        let response: YahooOptionsResponse = self.get_json(&url)?;

        chain_from_response(first_result(response)?, symbol, expiry)
    }

    /// Get full option surface (all expirations)
    pub fn get_option_surface(&self, symbol: &str) -> AnalyticsResult<QuoteSurface> {
        let spot_quote = self.get_quote(symbol)?;
        let expiries = self.get_expirations(symbol)?;

        let mut surface = QuoteSurface::new(symbol, spot_quote.price, Utc::now().date_naive());

        for expiry in expiries {
            match self.get_option_chain(symbol, expiry) {
                Ok((_, chain)) => surface.add_chain(chain),
                Err(e) => {
                    tracing::warn!("Failed to get chain for {}: {}", expiry, e);
                }
            }
        }

        tracing::info!(
            "Fetched {} quotes across {} expiries for {}",
            surface.total_quotes(),
            surface.chains.len(),
            symbol
        );
        Ok(surface)
    }
}

fn first_result(response: YahooOptionsResponse) -> AnalyticsResult<YahooOptionChainData> {
    response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| SkewError::data("No options data returned"))
}

/// Convert one Yahoo options payload into a quote chain
fn chain_from_response(
    data: YahooOptionChainData,
    symbol: &str,
    expiry: NaiveDate,
) -> AnalyticsResult<(f64, QuoteChain)> {
    let spot = data.quote.regular_market_price;
    let mut chain = QuoteChain::new(symbol, expiry);

    if let Some(options) = data.options.into_iter().next() {
        let sides = [(OptionType::Call, options.calls), (OptionType::Put, options.puts)];
        for (option_type, side) in sides {
            for option in side {
                if let Some(quote) = convert_option_quote(&option, symbol, expiry, option_type, spot) {
                    chain.add(quote);
                }
            }
        }
    }

    Ok((spot, chain))
}

fn convert_option_quote(
    data: &YahooOptionData,
    underlying: &str,
    expiry: NaiveDate,
    option_type: OptionType,
    spot: f64,
) -> Option<OptionQuote> {
    let strike = data.strike?;
    let contract = OptionContract::new(underlying, strike, expiry, option_type);

    let mut quote = OptionQuote::new(contract, data.bid, data.ask, data.last_price)
        .with_underlying_price(spot);
    if let Some(ts) = data.last_trade_date.and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        quote = quote.with_timestamp(ts);
    }
    Some(quote)
}

/// Spot price quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotQuote {
    pub symbol: String,
    pub price: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResult,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResult {
    result: Vec<YahooQuoteData>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: f64,
    bid: Option<f64>,
    ask: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    quote: YahooQuoteData,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price: Option<f64>,
    #[serde(rename = "lastTradeDate")]
    last_trade_date: Option<i64>,
}

/// Convenience function to fetch the full surface for a symbol
pub fn fetch_option_surface(symbol: &str) -> AnalyticsResult<QuoteSurface> {
    YahooClient::new()?.get_option_surface(symbol)
}
