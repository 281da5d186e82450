//! JSON report

use std::io::Write;

use crate::analysis::AnalysisReport;
use crate::core::AnalyticsResult;

use super::Reporter;

/// Serializes the whole report
#[derive(Debug, Clone)]
pub struct JsonReporter {
    pub pretty: bool,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Reporter for JsonReporter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> AnalyticsResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, report)?;
        } else {
            serde_json::to_writer(&mut *out, report)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;

    #[test]
    fn test_json_roundtrip_fields() {
        let report = sample_report();
        let json = JsonReporter::default().render(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["underlying"], "TEST");
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
        assert!(value["results"][0]["metrics"]["risk_reversal"].as_f64().unwrap() < 0.0);
        assert_eq!(value["results"][0]["points"].as_array().unwrap().len(), 9);

        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.results[0].expiry, report.results[0].expiry);
    }

    #[test]
    fn test_compact_json_single_line() {
        let report = sample_report();
        let json = JsonReporter { pretty: false }.render(&report).unwrap();
        assert_eq!(json.trim_end().lines().count(), 1);
    }
}
