//! # Option Skew - Implied Volatility Skew Analysis
//!
//! Measures the implied volatility skew of listed option chains.
//!
//! ## Overview
//!
//! For one underlying the pipeline:
//! - **Ingests** a chain from a JSON file or Yahoo Finance (optionally cached)
//! - **Cleans** quotes: missing prices, crossed or wide markets, duplicates
//! - **Solves** implied volatility per strike (Black-Scholes-Merton,
//!   Newton-Raphson with bisection fallback)
//! - **Measures** the smile: 25Δ risk reversal and butterfly, slope,
//!   curvature, wing spread, skewness, per-strike z-scores and Greeks
//! - **Reports** as console tables or JSON
//!
//! FX options use the same model with the foreign rate as the dividend yield
//! (Garman-Kohlhagen).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use option_skew::prelude::*;
//!
//! let surface = load_chain_file("chain.json").unwrap();
//! let report = SkewAnalyzer::new().analyze(&surface).unwrap();
//!
//! for result in &report.results {
//!     println!("{}: RR25 = {:?}", result.expiry, result.metrics.risk_reversal);
//! }
//! print!("{}", TextReporter::default().render(&report).unwrap());
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Price American exercise (European approximation only)
//! - Fit arbitrage-free surface parameterizations
//! - Forecast volatility or generate trading signals

pub mod analysis;
pub mod config;
pub mod core;
pub mod data;
pub mod models;
pub mod preprocess;
pub mod report;
pub mod strategy;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        AnalyticsResult, Greeks, ImpliedVolatilityPoint, MarketParams, OptionContract,
        OptionQuote, OptionType, QuoteChain, QuoteSurface, SkewError, SmileParams, VolSurface,
    };

    // Data ingest
    pub use crate::data::{
        fetch_option_surface, load_chain_file, parse_chain_json, to_chain_json, CacheConfig,
        CachedFetcher, DataCache, YahooClient,
    };

    // Pricing
    pub use crate::models::black_scholes::{
        greeks as bs_greeks, implied_volatility, price as bs_price, SolverConfig,
    };

    // Cleaning
    pub use crate::preprocess::{CleaningReport, DropReason, PreprocessConfig, Preprocessor};

    // Analysis
    pub use crate::analysis::{
        analyze_surface, solve_chain, z_score, AnalysisReport, SkewAnalyzer, SkewMetrics,
        SkewResult, SmileConfig, SmileSide, StrikeZScore, TermPoint, VolSmile,
    };

    pub use crate::config::{AnalysisConfig, MarketConfig};
    pub use crate::report::{JsonReporter, ReportFormat, Reporter, TextReporter};
    pub use crate::strategy::{Leg, PricedOption, Strategy};
}

// Re-export main types at crate root
pub use crate::analysis::{AnalysisReport, SkewAnalyzer};
pub use crate::config::AnalysisConfig;
pub use crate::core::{AnalyticsResult, SkewError};
