//! TickForge CLI — replay, multi-instrument and synthetic data commands.
//!
//! Commands:
//! - `replay`: replay one candle CSV through one engine
//! - `multi`: replay every `[[instruments]]` entry of a config concurrently
//! - `synthetic`: write a seeded synthetic candle CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tickforge_runner::{
    generate_synthetic_candles, load_candles, run_portfolio, run_replay, write_candles, ReplayReport, RunConfig,
};

#[derive(Parser)]
#[command(name = "tickforge", about = "TickForge CLI: tick-driven trading engine")]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a candle CSV for one symbol.
    Replay {
        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol the candles belong to.
        #[arg(long)]
        symbol: String,

        /// Candle CSV (timestamp,open,high,low,close,volume).
        #[arg(long)]
        candles: PathBuf,

        /// Write every decision event here as JSON lines.
        #[arg(long)]
        events: Option<PathBuf>,

        /// Write the replay report here as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Replay every instrument of a config concurrently.
    Multi {
        /// Path to a TOML run config with [[instruments]] entries.
        #[arg(long)]
        config: PathBuf,

        /// Write per-instrument summaries here as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Generate a seeded synthetic candle CSV.
    Synthetic {
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of one-minute candles.
        #[arg(long, default_value_t = 1_000)]
        count: usize,

        #[arg(long, default_value_t = 100.0)]
        start_price: f64,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Replay {
            config,
            symbol,
            candles,
            events,
            report,
        } => run_replay_cmd(config.as_deref(), &symbol, &candles, events.as_deref(), report.as_deref()),
        Commands::Multi { config, report } => run_multi_cmd(&config, report.as_deref()),
        Commands::Synthetic {
            symbol,
            seed,
            count,
            start_price,
            out,
        } => run_synthetic_cmd(&symbol, seed, count, start_price, &out),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_replay_cmd(
    config_path: Option<&Path>,
    symbol: &str,
    candles_path: &Path,
    events_path: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let candles = load_candles(candles_path)?;
    info!(symbol, candles = candles.len(), run_id = %config.run_id(), "starting replay");
    let report = run_replay(&config, symbol, &candles, None)?;

    print_summary(&report);

    if let Some(path) = events_path {
        report.write_events(path)?;
        println!("Events written to: {}", path.display());
    }
    if let Some(path) = report_path {
        report.write_json(path)?;
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

fn run_multi_cmd(config_path: &Path, report_path: Option<&Path>) -> Result<()> {
    let config = load_config(Some(config_path))?;
    if config.instruments.is_empty() {
        bail!("{} has no [[instruments]] entries", config_path.display());
    }

    info!(instruments = config.instruments.len(), run_id = %config.run_id(), "starting multi-instrument run");
    let report = run_portfolio(&config)?;

    println!();
    println!("=== Multi-instrument Results ===");
    println!("{:<12} {:>7} {:>12} {:>14}  Status", "Symbol", "Trades", "Net PnL", "Final Equity");
    for summary in report.summaries() {
        match &summary.error {
            None => println!(
                "{:<12} {:>7} {:>12.2} {:>14.2}  ok",
                summary.symbol, summary.trades, summary.total_pnl, summary.final_equity
            ),
            Some(err) => println!("{:<12} {:>7} {:>12} {:>14}  FAILED: {err}", summary.symbol, "-", "-", "-"),
        }
    }
    println!("Succeeded:       {}/{}", report.succeeded(), report.outcomes.len());
    println!("Total net PnL:   {:.2}", report.total_pnl());
    if let Some(book) = &report.allocator {
        println!(
            "Allocator:       capital {:.2}, peak {:.2}, still allocated {:.2}, granted {}, denied {}",
            book.capital, book.peak_capital, book.allocated, book.granted, book.denied
        );
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report.summaries())?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Report written to: {}", path.display());
    }

    if report.succeeded() == 0 {
        bail!("every instrument failed");
    }
    Ok(())
}

fn run_synthetic_cmd(symbol: &str, seed: u64, count: usize, start_price: f64, out: &Path) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    if !(start_price > 0.0) {
        bail!("--start-price must be positive (got {start_price})");
    }
    let candles = generate_synthetic_candles(symbol, seed, count, start_price);
    write_candles(out, &candles)?;
    println!("Wrote {} synthetic candles for {symbol} to {}", candles.len(), out.display());
    Ok(())
}

fn print_summary(report: &ReplayReport) {
    let stats = &report.statistics;
    println!();
    println!("=== Replay Results ===");
    println!("Symbol:          {}", report.symbol);
    println!("Strategy:        {}", report.strategy);
    println!("Candles:         {}", report.candle_count);
    println!("Ticks:           {}", stats.tick_count);
    println!("Trades:          {}", stats.trade_count);
    println!("Win rate:        {:.1}%", stats.win_rate);
    println!("Net PnL:         {:.2}", stats.total_pnl);
    println!("Fees:            {:.2}", stats.total_fees);
    println!("Final equity:    {:.2}", report.final_equity);
    println!("Final state:     {}", stats.state);
    for (reason, count) in &stats.exits_by_reason {
        println!("  {reason:<14} {count}");
    }
    println!("Fingerprint:     {}", report.fingerprint);
    println!("Run id:          {}", report.run_id);
}
