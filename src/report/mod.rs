//! Report rendering
//!
//! - **Text**: console tables per expiry, term structure and surface grid
//! - **JSON**: the full `AnalysisReport` via serde

mod json;
mod text;

pub use json::*;
pub use text::*;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisReport;
use crate::core::{AnalyticsResult, SkewError};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportFormat {
    type Err = SkewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(SkewError::invalid_input(format!(
                "Unknown report format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Writes an analysis report to a sink
pub trait Reporter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> AnalyticsResult<()>;

    /// Render into a string
    fn render(&self, report: &AnalysisReport) -> AnalyticsResult<String> {
        let mut buf = Vec::new();
        self.write_report(report, &mut buf)?;
        String::from_utf8(buf).map_err(|e| SkewError::Serialization(e.to_string()))
    }
}

/// Reporter for a format with default settings
pub fn reporter_for(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Text => Box::new(TextReporter::default()),
        ReportFormat::Json => Box::new(JsonReporter::default()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::analysis::{AnalysisReport, SkewAnalyzer};
    use crate::config::AnalysisConfig;
    use crate::core::{OptionContract, OptionQuote, OptionType, QuoteChain, QuoteSurface};
    use crate::models::black_scholes;

    /// One-expiry report over a skewed synthetic chain
    pub fn sample_report() -> AnalysisReport {
        let config = AnalysisConfig::permissive();
        let market = config.market.params(100.0);
        let valuation = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2025, 4, 17).unwrap();
        let time = crate::core::year_fraction(valuation, expiry);

        let mut chain = QuoteChain::new("TEST", expiry);
        for i in 0..9 {
            let strike = 80.0 + 5.0 * i as f64;
            let k = (strike / 100.0).ln();
            let vol = 0.20 - 0.25 * k + 0.5 * k * k;
            for option_type in [OptionType::Call, OptionType::Put] {
                let px = black_scholes::price(&market, strike, vol, time, option_type);
                let contract = OptionContract::new("TEST", strike, expiry, option_type);
                chain.add(OptionQuote::new(contract, None, None, Some(px)));
            }
        }

        let mut surface = QuoteSurface::new("TEST", 100.0, valuation);
        surface.add_chain(chain);
        SkewAnalyzer::with_config(config).analyze(&surface).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::default().to_string(), "text");
    }

    #[test]
    fn test_reporter_for_format() {
        let report = fixtures::sample_report();
        let text = reporter_for(ReportFormat::Text).render(&report).unwrap();
        let json = reporter_for(ReportFormat::Json).render(&report).unwrap();

        assert!(text.contains("TEST"));
        assert!(json.trim_start().starts_with('{'));
    }
}
