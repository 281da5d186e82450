//! Pricing Models
//!
//! Implements:
//! - Black-Scholes-Merton (pricing, Greeks, implied volatility inversion)

pub mod black_scholes;

pub use black_scholes::*;
