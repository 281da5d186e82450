//! Example: Skew report for a synthetic equity chain
//!
//! Run with: cargo run --example skew_report

use chrono::{Datelike, NaiveDate};
use option_skew::prelude::*;

fn main() -> AnalyticsResult<()> {
    let spot = 500.0;
    let valuation = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    let market = MarketParams::equity(spot, 0.045, 0.013);

    // Typical index smile: rich downside, convex wings
    let smile = |strike: f64, time: f64| {
        let k = (strike / spot).ln();
        0.16 + 0.03 * time.sqrt() - 0.35 * k + 0.9 * k * k
    };

    let mut surface = QuoteSurface::new("DEMO", spot, valuation);
    for expiry in [
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 21).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
    ] {
        let time = option_skew::core::year_fraction(valuation, expiry);
        let mut chain = QuoteChain::new("DEMO", expiry);

        for i in 0..21 {
            let strike = 450.0 + 5.0 * i as f64;
            let mut vol = smile(strike, time);
            // One dislocated strike on the March expiry
            if expiry.month() == 3 && strike == 480.0 {
                vol += 0.04;
            }
            for option_type in [OptionType::Call, OptionType::Put] {
                let fair = bs_price(&market, strike, vol, time, option_type);
                let half_spread = (0.01 * fair).max(0.02);
                let contract = OptionContract::new("DEMO", strike, expiry, option_type);
                chain.add(OptionQuote::new(
                    contract,
                    Some((fair - half_spread).max(0.0)),
                    Some(fair + half_spread),
                    None,
                ));
            }
        }
        surface.add_chain(chain);
    }

    // Round-trip through the chain file format
    let json = to_chain_json(&surface)?;
    let surface = parse_chain_json(&json)?;

    let config = AnalysisConfig {
        market: MarketConfig {
            rate: 0.045,
            dividend_yield: 0.013,
        },
        ..AnalysisConfig::default()
    };
    let report = SkewAnalyzer::with_config(config).analyze(&surface)?;

    print!("{}", TextReporter::full().render(&report)?);

    println!("\n=== 25D Risk Reversal Strategy (front expiry) ===\n");
    if let Some(front) = report.front() {
        let forward = front.forward;
        let put = PricedOption::new(
            forward * 0.95,
            front.time_to_expiry,
            OptionType::Put,
            0.20,
            market,
        );
        let call = PricedOption::new(
            forward * 1.05,
            front.time_to_expiry,
            OptionType::Call,
            0.14,
            market,
        );
        let rr = Strategy::risk_reversal(put, call);
        println!("Price: {:.4}", rr.price());
        println!("Delta: {:.4}", rr.delta());
        println!("Break-even on a 10pt move: {:.4}", rr.break_even(10.0)?);
    }

    Ok(())
}
