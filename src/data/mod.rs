//! Data ingestion
//!
//! Handles:
//! - Local JSON option chain files
//! - Yahoo Finance options API
//! - Local caching of fetched surfaces

pub mod cache;
pub mod file;
pub mod yahoo;

pub use cache::*;
pub use file::*;
pub use yahoo::*;
