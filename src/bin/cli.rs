//! Option Skew CLI
//!
//! Command-line interface for implied volatility skew analysis.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use option_skew::models::black_scholes;
use option_skew::prelude::*;

#[derive(Parser)]
#[command(name = "skew")]
#[command(about = "Implied volatility skew and Greeks for option chains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the skew of an option chain
    Analyze(AnalyzeArgs),

    /// Price an option and print its Greeks
    Greeks(GreeksArgs),

    /// Z-score of one strike's implied vol within its smile
    Zscore(ZscoreArgs),

    /// Run the built-in equity and FX worked examples
    Demo,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Chain file (JSON)
    #[arg(short, long, conflicts_with = "symbol", required_unless_present = "symbol")]
    input: Option<PathBuf>,

    /// Fetch the chain from Yahoo Finance
    #[arg(short, long)]
    symbol: Option<String>,

    /// Cache directory for fetched chains
    #[arg(long, requires = "symbol")]
    cache_dir: Option<PathBuf>,

    /// Ignore any cached chain
    #[arg(long, requires = "symbol")]
    refresh: bool,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: ReportFormat,

    /// Include the strike/expiry vol grid in text output
    #[arg(long)]
    surface: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SettingsArgs {
    /// Config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Risk-free rate (overrides config)
    #[arg(long)]
    rate: Option<f64>,

    /// Dividend yield or foreign rate (overrides config)
    #[arg(long)]
    dividend: Option<f64>,
}

#[derive(Args)]
struct GreeksArgs {
    #[arg(long)]
    spot: f64,

    #[arg(long)]
    strike: f64,

    /// Time to expiry in years
    #[arg(long)]
    expiry_years: f64,

    /// Volatility (0.20 = 20%)
    #[arg(long, required_unless_present = "price")]
    vol: Option<f64>,

    /// Market price; solves for implied vol instead of taking --vol
    #[arg(long, conflicts_with = "vol")]
    price: Option<f64>,

    #[arg(long, default_value_t = 0.05)]
    rate: f64,

    /// Dividend yield or foreign rate
    #[arg(long, default_value_t = 0.0)]
    dividend: f64,

    /// call or put
    #[arg(long = "type", default_value = "call")]
    option_type: OptionType,
}

#[derive(Args)]
struct ZscoreArgs {
    /// Chain file (JSON)
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long)]
    strike: f64,

    /// Expiry (YYYY-MM-DD); defaults to the nearest
    #[arg(long)]
    expiry: Option<NaiveDate>,

    #[command(flatten)]
    settings: SettingsArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Greeks(args) => run_greeks(args),
        Commands::Zscore(args) => run_zscore(args),
        Commands::Demo => run_demo(),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

impl SettingsArgs {
    fn load(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(rate) = self.rate {
            config.market.rate = rate;
        }
        if let Some(dividend) = self.dividend {
            config.market.dividend_yield = dividend;
        }
        Ok(config)
    }
}

fn load_chain(path: &Path) -> Result<QuoteSurface> {
    load_chain_file(path).with_context(|| format!("Failed to load chain file {}", path.display()))
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = args.settings.load()?;

    let surface = match (&args.input, &args.symbol) {
        (Some(path), _) => load_chain(path)?,
        (None, Some(symbol)) => {
            let mut cache = CacheConfig::default();
            if let Some(dir) = &args.cache_dir {
                cache.cache_dir = dir.clone();
            }
            let fetcher = CachedFetcher::new(cache).context("Failed to open cache")?;
            let fetched = if args.refresh {
                fetcher.refresh_surface(symbol)
            } else {
                fetcher.get_surface(symbol)
            };
            fetched.with_context(|| format!("Failed to fetch option chain for {}", symbol))?
        }
        (None, None) => bail!("Either --input or --symbol is required"),
    };

    let report = SkewAnalyzer::with_config(config)
        .analyze(&surface)
        .with_context(|| format!("Analysis failed for {}", surface.underlying))?;

    let reporter: Box<dyn Reporter> = match args.format {
        ReportFormat::Text => Box::new(TextReporter {
            show_points: true,
            show_surface: args.surface,
        }),
        ReportFormat::Json => Box::new(JsonReporter::default()),
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            reporter.write_report(&report, &mut out)?;
            out.flush()?;
            tracing::info!("Wrote {} report to {}", args.format, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            reporter.write_report(&report, &mut out)?;
        }
    }

    Ok(())
}

fn run_greeks(args: GreeksArgs) -> Result<()> {
    let market = MarketParams::equity(args.spot, args.rate, args.dividend);
    market.validate()?;

    let vol = match (args.vol, args.price) {
        (Some(vol), _) => vol,
        (None, Some(price)) => {
            let iv = black_scholes::implied_volatility(
                price,
                &market,
                args.strike,
                args.expiry_years,
                args.option_type,
            )
            .context("Implied volatility solve failed")?;
            println!("Implied vol: {:.4}%", iv * 100.0);
            iv
        }
        (None, None) => bail!("Either --vol or --price is required"),
    };

    let option = PricedOption::new(args.strike, args.expiry_years, args.option_type, vol, market);
    print_option(&format!("{} K={:.2}", args.option_type, args.strike), &option);
    Ok(())
}

fn run_zscore(args: ZscoreArgs) -> Result<()> {
    let config = args.settings.load()?;
    let surface = load_chain(&args.input)?;
    let report = SkewAnalyzer::with_config(config).analyze(&surface)?;

    let z = report.z_score(args.strike, args.expiry)?;
    let expiry = args
        .expiry
        .or_else(|| report.front().map(|r| r.expiry))
        .map(|d| d.to_string())
        .unwrap_or_default();

    println!("Z-score for {} strike {:.2} ({}): {:.4}", report.underlying, args.strike, expiry, z);
    Ok(())
}

/// Worked examples: equity options with a dividend yield, then an FX risk reversal
fn run_demo() -> Result<()> {
    println!("Option Skew Demo");
    println!("================");

    println!("\n=== Equity (S=100, r=2%, q=3%, T=1y) ===");
    let equity = MarketParams::equity(100.0, 0.02, 0.03);
    let equity_vols = [(95.0, 0.20), (100.0, 0.18), (105.0, 0.16)];

    let put = PricedOption::new(95.0, 1.0, OptionType::Put, 0.20, equity);
    let call = PricedOption::new(105.0, 1.0, OptionType::Call, 0.16, equity);
    print_option("Put K=95", &put);
    print_option("Call K=105", &call);
    println!("\nZ-Score for Strike 100: {:.4}", z_score(&equity_vols, 100.0)?);

    println!("\n=== FX (S=145, r_d=1%, r_f=0%, T=0.5y) ===");
    let fx = MarketParams::fx(145.0, 0.01, 0.0);
    let fx_vols = [(140.0, 0.15), (145.0, 0.12), (150.0, 0.10)];

    let put = PricedOption::new(143.0, 0.5, OptionType::Put, 0.15, fx);
    let call = PricedOption::new(147.0, 0.5, OptionType::Call, 0.10, fx);
    let risk_reversal = Strategy::risk_reversal(put, call);

    println!("\nRisk Reversal Price: {:.4}", risk_reversal.price());
    println!("Risk Reversal Delta: {:.4}", risk_reversal.delta());
    print_option("Put K=143", &put);
    print_option("Call K=147", &call);
    println!("\nZ-Score for Strike 145: {:.4}", z_score(&fx_vols, 145.0)?);

    Ok(())
}

fn print_option(label: &str, option: &PricedOption) {
    let g = option.greeks();
    println!("\n--- {} ---", label);
    println!("  Price: {:.4}", option.price());
    println!("  Delta: {:.4}", g.delta);
    println!("  Gamma: {:.6}", g.gamma);
    println!("  Vega:  {:.4}", g.vega);
    println!("  Theta: {:.4}", g.theta);
    println!("  Rho:   {:.4}", g.rho);
}
