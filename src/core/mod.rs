//! Core data types for skew analysis
//!
//! Defines fundamental types:
//! - OptionContract / MarketParams: contract terms and pricing inputs
//! - OptionQuote / QuoteChain / QuoteSurface: ingested market data
//! - ImpliedVolatilityPoint: solver output per strike
//! - VolSurface: implied volatility grid
//! - Greeks, SkewError

pub mod error;
pub mod greeks;
pub mod option;
pub mod quote;
pub mod surface;
pub mod volatility;

pub use error::*;
pub use greeks::*;
pub use option::*;
pub use quote::*;
pub use surface::*;
pub use volatility::*;
