use klinebot::analysis::AlternationReport;
use klinebot::api::BinanceClient;
use klinebot::backtest::LogObserver;
use klinebot::storage::KlineStore;
use klinebot::{BacktestConfig, BacktestEngine, Result};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_SYMBOL: &str = "XRPUSDT";
const DEFAULT_INTERVAL: &str = "1m";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_RESULTS_DIR: &str = "./results";

const DAY_MS: i64 = 86_400_000;
const CANDLES_PER_DAY: usize = 1440;
const API_MAX_LIMIT: u32 = 1500; // Binance caps klines at 1500 rows per request

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(name = "klinebot", about = "Minute-candle collection, backtesting and analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download one day of minute candles from Binance into the data directory
    Collect {
        /// Futures pair, e.g. XRPUSDT
        #[arg(long)]
        symbol: Option<String>,
        /// Candle interval, e.g. 1m
        #[arg(long)]
        interval: Option<String>,
        /// UTC day to fetch (YYYY-MM-DD); defaults to TARGET_DATE or yesterday
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Replay one symbol's stored day files through the backtest engine
    Backtest {
        /// Futures pair, e.g. XRPUSDT
        #[arg(long)]
        symbol: Option<String>,
        /// Candle interval, e.g. 1m
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write the full report (trade ledger included) as JSON to this path
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        initial_equity: Option<f64>,
        #[arg(long)]
        position_size_usd: Option<f64>,
        #[arg(long)]
        stop_loss_fraction: Option<f64>,
        #[arg(long)]
        fee_rate: Option<f64>,
        #[arg(long)]
        losses_before_pause: Option<u32>,
        #[arg(long)]
        pause_duration_ms: Option<i64>,
    },
    /// Count alternating bull/bear runs across all stored day files
    Analyze {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Collect {
            symbol,
            interval,
            date,
            data_dir,
        } => run_collect(symbol, interval, date, data_dir).await,
        Command::Backtest {
            symbol,
            interval,
            data_dir,
            out,
            initial_equity,
            position_size_usd,
            stop_loss_fraction,
            fee_rate,
            losses_before_pause,
            pause_duration_ms,
        } => {
            let config = build_config(
                initial_equity,
                position_size_usd,
                stop_loss_fraction,
                fee_rate,
                losses_before_pause,
                pause_duration_ms,
            );
            run_backtest(symbol, interval, data_dir, out, config).await
        }
        Command::Analyze {
            data_dir,
            results_dir,
        } => run_analyze(data_dir, results_dir).await,
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn setup_logging() {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();
}

/// RUST_LOG wins when set; otherwise default to crate-level info
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("klinebot=info"))
}

/// Resolve a setting: CLI flag, then environment, then default
fn resolve(flag: Option<String>, env_key: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(env_key).ok())
        .unwrap_or_else(|| default.to_string())
}

fn resolve_path(flag: Option<PathBuf>, env_key: &str, default: &str) -> PathBuf {
    flag.or_else(|| std::env::var(env_key).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

fn resolve_date(flag: Option<NaiveDate>) -> Result<NaiveDate> {
    if let Some(date) = flag {
        return Ok(date);
    }

    if let Ok(raw) = std::env::var("TARGET_DATE") {
        return raw
            .parse()
            .map_err(|e| format!("Invalid TARGET_DATE {:?}: {}", raw, e).into());
    }

    // Yesterday is the most recent fully closed UTC day
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| "Date arithmetic underflow".into())
}

/// Epoch-ms bounds of one UTC day: [00:00:00.000, 23:59:59.999]
fn day_window_ms(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + DAY_MS - 1)
}

fn build_config(
    initial_equity: Option<f64>,
    position_size_usd: Option<f64>,
    stop_loss_fraction: Option<f64>,
    fee_rate: Option<f64>,
    losses_before_pause: Option<u32>,
    pause_duration_ms: Option<i64>,
) -> BacktestConfig {
    let mut config = BacktestConfig::default();
    if let Some(v) = initial_equity {
        config.initial_equity = v;
    }
    if let Some(v) = position_size_usd {
        config.position_size_usd = v;
    }
    if let Some(v) = stop_loss_fraction {
        config.stop_loss_fraction = v;
    }
    if let Some(v) = fee_rate {
        config.fee_rate = v;
    }
    if let Some(v) = losses_before_pause {
        config.losses_before_pause = v;
    }
    if let Some(v) = pause_duration_ms {
        config.pause_duration_ms = v;
    }
    config
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_collect(
    symbol: Option<String>,
    interval: Option<String>,
    date: Option<NaiveDate>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let symbol = resolve(symbol, "SYMBOL", DEFAULT_SYMBOL);
    let interval = resolve(interval, "INTERVAL", DEFAULT_INTERVAL);
    let data_dir = resolve_path(data_dir, "DATA_DIR", DEFAULT_DATA_DIR);
    let date = resolve_date(date)?;

    tracing::info!("📥 Collecting {} {} candles for {}", symbol, interval, date);

    let client = BinanceClient::new()?;
    let (start_ms, end_ms) = day_window_ms(date);
    let klines = client
        .fetch_klines(&symbol, &interval, start_ms, end_ms, API_MAX_LIMIT)
        .await?;

    if klines.is_empty() {
        tracing::warn!("No candles returned for {}; nothing to save", date);
        return Ok(());
    }
    if klines.len() != CANDLES_PER_DAY {
        tracing::warn!(
            "Expected {} candles for {}, got {} (partial day?)",
            CANDLES_PER_DAY,
            date,
            klines.len()
        );
    }

    let store = KlineStore::new(data_dir);
    let path = store.save_day(&symbol, &interval, date, &klines).await?;

    tracing::info!("✅ Saved {} candles to {}", klines.len(), path.display());
    Ok(())
}

async fn run_backtest(
    symbol: Option<String>,
    interval: Option<String>,
    data_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    config: BacktestConfig,
) -> Result<()> {
    let symbol = resolve(symbol, "SYMBOL", DEFAULT_SYMBOL);
    let interval = resolve(interval, "INTERVAL", DEFAULT_INTERVAL);
    let data_dir = resolve_path(data_dir, "DATA_DIR", DEFAULT_DATA_DIR);

    // Only this symbol's files; other instruments stored alongside must
    // not leak into the ledger
    let store = KlineStore::new(&data_dir);
    let days = store.load_days(&symbol, &interval).await?;
    if days.is_empty() {
        tracing::warn!(
            "No {} {} day files found in {}; run `klinebot collect` first",
            symbol,
            interval,
            data_dir.display()
        );
        return Ok(());
    }

    let total_candles: usize = days.iter().map(|day| day.len()).sum();
    tracing::info!(
        "🚀 Backtesting {} candles across {} {} day files",
        total_candles,
        days.len(),
        symbol
    );

    let engine = BacktestEngine::new(config)?;
    let report = engine.run_with_observer(&days, &mut LogObserver)?;

    report.print_summary();

    if let Some(out) = out {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&out, json).await?;
        tracing::info!("💾 Full report written to {}", out.display());
    }

    Ok(())
}

async fn run_analyze(data_dir: Option<PathBuf>, results_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = resolve_path(data_dir, "DATA_DIR", DEFAULT_DATA_DIR);
    let results_dir = resolve_path(results_dir, "RESULTS_DIR", DEFAULT_RESULTS_DIR);

    let store = KlineStore::new(&data_dir);
    let files = store.list_all().await?;
    if files.is_empty() {
        tracing::warn!(
            "No day files found in {}; run `klinebot collect` first",
            data_dir.display()
        );
        return Ok(());
    }

    tracing::info!("🔍 Analyzing {} day files for alternating runs", files.len());

    let mut report = AlternationReport::new();
    for path in &files {
        let klines = store.load_day(path).await?;
        report.record_day(&klines);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    let path = report.save(&results_dir).await?;
    tracing::info!("✅ Report saved to {}", path.display());
    Ok(())
}
