//! Console report

use std::io::Write;

use crate::analysis::{AnalysisReport, SkewResult};
use crate::core::{AnalyticsResult, Greeks, VolSurface};

use super::Reporter;

/// Plain-text tables
#[derive(Debug, Clone)]
pub struct TextReporter {
    /// Print every solved strike
    pub show_points: bool,
    /// Print the strike/expiry vol grid
    pub show_surface: bool,
}

impl Default for TextReporter {
    fn default() -> Self {
        Self {
            show_points: true,
            show_surface: false,
        }
    }
}

impl TextReporter {
    /// Summary only: metrics, Greeks and term structure
    pub fn compact() -> Self {
        Self {
            show_points: false,
            show_surface: false,
        }
    }

    /// Everything, including the surface grid
    pub fn full() -> Self {
        Self {
            show_points: true,
            show_surface: true,
        }
    }

    fn write_expiry(&self, result: &SkewResult, out: &mut dyn Write) -> AnalyticsResult<()> {
        writeln!(
            out,
            "\n--- {} ({:.0} days, F = {:.4}) ---",
            result.expiry,
            result.days_to_expiry(),
            result.forward
        )?;

        let m = &result.metrics;
        writeln!(out, "  ATM vol:         {}", pct(m.atm_vol))?;
        writeln!(out, "  25D risk rev:    {}", pct(m.risk_reversal))?;
        writeln!(out, "  25D butterfly:   {}", pct(m.butterfly))?;
        writeln!(out, "  Slope dσ/dlnK:   {}", num(m.slope))?;
        writeln!(out, "  Curvature:       {}", num(m.curvature))?;
        writeln!(out, "  Put-call skew:   {}", pct(m.put_call_skew))?;
        writeln!(out, "  Skewness:        {}", num(m.skewness))?;
        writeln!(out, "  Vol range:       {} .. {}", pct(m.min_vol), pct(m.max_vol))?;

        if let Some(strike) = result.atm_strike {
            writeln!(out, "\n  Greeks at K = {:.2}:", strike)?;
            writeln!(
                out,
                "  {:<6} {:>9} {:>10} {:>9} {:>9} {:>9}",
                "", "Delta", "Gamma", "Vega", "Theta", "Rho"
            )?;
            if let Some(g) = &result.call_greeks {
                write_greeks_row(out, "Call", g)?;
            }
            if let Some(g) = &result.put_greeks {
                write_greeks_row(out, "Put", g)?;
            }
        }

        if self.show_points && !result.z_scores.is_empty() {
            writeln!(out, "\n  {:>10} {:>8} {:>8} {:>8}", "Strike", "IV", "Z", "Local Z")?;
            for z in &result.z_scores {
                writeln!(
                    out,
                    "  {:>10.2} {:>7.2}% {:>8} {:>8}{}",
                    z.strike,
                    z.implied_vol * 100.0,
                    num2(z.z_score),
                    num2(z.robust_z),
                    if z.dislocated { "  *" } else { "" }
                )?;
            }
        }

        let dislocations = result.dislocations();
        if !dislocations.is_empty() {
            let strikes: Vec<String> = dislocations.iter().map(|z| format!("{:.2}", z.strike)).collect();
            writeln!(out, "\n  Dislocated strikes: {}", strikes.join(", "))?;
        }

        if result.failed_solves > 0 {
            writeln!(out, "  ({} quotes could not be solved)", result.failed_solves)?;
        }

        Ok(())
    }
}

impl Reporter for TextReporter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> AnalyticsResult<()> {
        let title = format!("Skew Report: {}", report.underlying);
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", "=".repeat(title.len()))?;
        writeln!(out, "  Valuation date: {}", report.valuation_date)?;
        writeln!(out, "  Spot:           {:.4}", report.spot)?;
        writeln!(out, "  Rate:           {:.2}%", report.market.rate * 100.0)?;
        writeln!(out, "  Dividend yield: {:.2}%", report.market.dividend_yield * 100.0)?;

        let cleaning = &report.cleaning;
        writeln!(out, "  Quotes kept:    {} of {}", cleaning.kept, cleaning.input)?;
        for (reason, count) in &cleaning.dropped {
            writeln!(out, "    dropped {:<20} {}", reason.label(), count)?;
        }

        for result in &report.results {
            self.write_expiry(result, out)?;
        }

        for skipped in &report.skipped {
            writeln!(
                out,
                "\n--- {} skipped: none of {} quotes could be solved ---",
                skipped.expiry, skipped.failed_solves
            )?;
        }

        if report.term_structure.len() > 1 {
            writeln!(out, "\n--- Term Structure ---")?;
            writeln!(out, "  {:<12} {:>7} {:>9} {:>9} {:>9}", "Expiry", "Days", "ATM", "25D RR", "Slope")?;
            for point in &report.term_structure {
                writeln!(
                    out,
                    "  {:<12} {:>7.0} {:>9} {:>9} {:>9}",
                    point.expiry.to_string(),
                    point.time * crate::core::DAYS_PER_YEAR,
                    pct(point.atm_vol),
                    pct(point.risk_reversal),
                    num(point.slope)
                )?;
            }
        }

        if self.show_surface {
            if let Some(surface) = &report.surface {
                write_surface(surface, out)?;
            }
        }

        Ok(())
    }
}

fn write_greeks_row(out: &mut dyn Write, label: &str, g: &Greeks) -> AnalyticsResult<()> {
    writeln!(
        out,
        "  {:<6} {:>9.4} {:>10.6} {:>9.4} {:>9.4} {:>9.4}",
        label, g.delta, g.gamma, g.vega, g.theta, g.rho
    )?;
    Ok(())
}

fn write_surface(surface: &VolSurface, out: &mut dyn Write) -> AnalyticsResult<()> {
    writeln!(out, "\n--- Implied Vol Surface (%) ---")?;
    write!(out, "  {:>10}", "Strike")?;
    for expiry in &surface.expiry_dates {
        write!(out, " {:>11}", expiry.to_string())?;
    }
    writeln!(out)?;

    for (si, strike) in surface.strikes.iter().enumerate() {
        write!(out, "  {:>10.2}", strike)?;
        for ti in 0..surface.times.len() {
            write!(out, " {:>11.2}", surface.vols[[si, ti]] * 100.0)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

fn num2(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
