use klinebot::analysis::AlternationReport;
use klinebot::backtest::{LogObserver, MarketScenario, SyntheticKlineGenerator};
use klinebot::models::PositionSide;
use klinebot::*;

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 86_400_000;
const START_MS: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z

fn create_kline(open_time: i64, open: f64, high: f64, low: f64, close: f64) -> Kline {
    Kline {
        open_time,
        open: open.to_string(),
        high: high.to_string(),
        low: low.to_string(),
        close: close.to_string(),
        volume: "1000".to_string(),
    }
}

/// Candle that loses for the given side without touching a 2% stop
fn losing_kline(open_time: i64, side: PositionSide) -> Kline {
    match side {
        PositionSide::Long => create_kline(open_time, 100.0, 100.1, 99.4, 99.5),
        PositionSide::Short => create_kline(open_time, 100.0, 100.6, 99.9, 100.5),
    }
}

fn no_fee_config() -> BacktestConfig {
    BacktestConfig {
        fee_rate: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_three_candle_scenario() {
    // Wide stop and zero fees: every candle settles at its close
    let config = BacktestConfig {
        stop_loss_fraction: 0.5,
        fee_rate: 0.0,
        ..Default::default()
    };

    let day = vec![
        create_kline(0, 100.0, 101.5, 99.5, 101.0),           // long wins
        create_kline(MINUTE_MS, 101.0, 101.2, 100.3, 100.5),  // long loses -> flip
        create_kline(2 * MINUTE_MS, 100.5, 100.6, 98.9, 99.0), // short wins
    ];

    let engine = BacktestEngine::new(config).unwrap();
    let report = engine.run(&[day]).unwrap();

    let sides: Vec<PositionSide> = report.trades.iter().map(|t| t.side).collect();
    assert_eq!(
        sides,
        vec![PositionSide::Long, PositionSide::Long, PositionSide::Short]
    );

    // 1000 + (101-100)*(100/100) + (100.5-101)*(100/101) + (100.5-99)*(100/100.5)
    let expected = 1000.0 + 1.0 - 0.5 * (100.0 / 101.0) + 1.5 * (100.0 / 100.5);
    assert!(
        (report.final_equity - expected).abs() < 1e-9,
        "final equity {} should be {}",
        report.final_equity,
        expected
    );

    assert_eq!(report.total_trades, 3);
    assert_eq!(report.winning_trades, 2);
    assert_eq!(report.losing_trades, 1);
    assert_eq!(report.pause_count, 0);
    assert!((report.win_rate_percent - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_equity_matches_trade_ledger() {
    let mut generator = SyntheticKlineGenerator::new(7);
    let day = generator.generate(MarketScenario::Whipsaw, 1440, START_MS);

    let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
    let report = engine.run(&[day]).unwrap();

    let ledger_pnl: f64 = report.trades.iter().map(|t| t.pnl).sum();
    assert!(
        (report.total_pnl - ledger_pnl).abs() < 1e-6,
        "report pnl {} should match ledger sum {}",
        report.total_pnl,
        ledger_pnl
    );
    assert_eq!(
        report.winning_trades + report.losing_trades,
        report.total_trades
    );
}

#[test]
fn test_runs_are_idempotent() {
    let mut generator = SyntheticKlineGenerator::new(42);
    let day = generator.generate(MarketScenario::FlashCrash, 1440, START_MS);
    let days = vec![day];

    let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
    let first = engine.run(&days).unwrap();
    let second = engine.run(&days).unwrap();

    // Byte-identical reports, trade ledger included
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_pause_carries_across_day_files() {
    let engine = BacktestEngine::new(no_fee_config()).unwrap();

    // Day 1: four straight losses; the fourth (at t=180000) arms a
    // 10-minute pause until t=780000
    let day1 = vec![
        losing_kline(0, PositionSide::Long),
        losing_kline(MINUTE_MS, PositionSide::Short),
        losing_kline(2 * MINUTE_MS, PositionSide::Long),
        losing_kline(3 * MINUTE_MS, PositionSide::Short),
    ];

    // Day 2: one candle inside the pause window, one exactly at its
    // expiry, one after
    let day2 = vec![
        create_kline(720_000, 100.0, 101.0, 99.9, 100.8),
        create_kline(780_000, 100.0, 101.0, 99.9, 100.8),
        create_kline(840_000, 100.8, 101.5, 100.7, 101.2),
    ];

    let report = engine.run(&[day1, day2]).unwrap();

    assert_eq!(report.pause_count, 1);
    assert_eq!(report.total_trades, 6, "the 720000 candle must be skipped");
    assert_eq!(report.trades[3].timestamp, 3 * MINUTE_MS);
    assert_eq!(report.trades[4].timestamp, 780_000);
    assert_eq!(report.trades[5].timestamp, 840_000);

    // After the pause the streak restarts from zero
    assert_eq!(report.losing_trades, 4);
    assert_eq!(report.winning_trades, 2);
}

#[tokio::test]
async fn test_backtest_replays_only_the_requested_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let store = KlineStore::new(dir.path());
    let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    // Two instruments side by side in one data dir
    let btc_day = vec![create_kline(0, 100.0, 100.5, 99.8, 100.2)];
    let xrp_day = vec![create_kline(0, 0.5, 0.51, 0.498, 0.502)];
    store.save_day("BTCUSDT", "1m", date, &btc_day).await.unwrap();
    store.save_day("XRPUSDT", "1m", date, &xrp_day).await.unwrap();

    let days = store.load_days("XRPUSDT", "1m").await.unwrap();
    assert_eq!(days.len(), 1);

    let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
    let report = engine.run(&days).unwrap();

    assert_eq!(report.total_trades, 1, "only the XRPUSDT day must be replayed");
    assert_eq!(
        report.trades[0].entry_price, 0.5,
        "entry must come from the XRPUSDT candle, not the BTCUSDT one"
    );
}

#[test]
fn test_malformed_candle_fails_run() {
    let mut bad = create_kline(MINUTE_MS, 100.0, 100.5, 99.5, 100.2);
    bad.high = "abc".to_string();
    let day = vec![create_kline(0, 100.0, 100.5, 99.5, 100.2), bad];

    let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
    let err = engine.run(&[day]).unwrap_err().to_string();

    assert!(err.contains("60000"), "error should name the candle: {}", err);
    assert!(err.contains("high"), "error should name the field: {}", err);
}

#[tokio::test]
async fn test_store_to_engine_pipeline() {
    // Initialize logging
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Store -> Engine -> Analysis Pipeline ===\n");

    // 1. Generate two synthetic trading days
    println!("1. Generating synthetic days...");
    let mut generator = SyntheticKlineGenerator::new(42);
    let day1 = generator.generate(MarketScenario::Uptrend, 1440, START_MS);
    let day2 = generator.generate(MarketScenario::FlashCrash, 1440, START_MS + DAY_MS);
    println!("   ✓ {} + {} candles", day1.len(), day2.len());

    // 2. Save them out of order
    println!("\n2. Saving day files (out of order)...");
    let dir = tempfile::tempdir().unwrap();
    let store = KlineStore::new(dir.path());
    let date1 = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let date2 = chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    store.save_day("XRPUSDT", "1m", date2, &day2).await.unwrap();
    store.save_day("XRPUSDT", "1m", date1, &day1).await.unwrap();
    println!("   ✓ 2 files in {}", store.data_dir().display());

    // 3. Load the symbol's days back, sorted
    println!("\n3. Loading XRPUSDT day files...");
    let days = store.load_days("XRPUSDT", "1m").await.unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0][0].open_time, START_MS, "days must come back sorted");
    assert_eq!(days[1][0].open_time, START_MS + DAY_MS);
    println!("   ✓ Sorted chronologically");

    // 4. Run the backtest over both days
    println!("\n4. Running backtest...");
    let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
    let report = engine.run_with_observer(&days, &mut LogObserver).unwrap();
    assert!(report.total_trades > 0);
    assert!(report.total_trades <= 2880);
    assert_eq!(report.trades.len(), report.total_trades);
    println!(
        "   ✓ {} trades, final equity {:.2}",
        report.total_trades, report.final_equity
    );

    // 5. Run the alternation analysis over the same files
    println!("\n5. Analyzing alternating runs...");
    let mut analysis = AlternationReport::new();
    for path in store.list_all().await.unwrap() {
        let klines = store.load_day(&path).await.unwrap();
        analysis.record_day(&klines);
    }
    assert_eq!(analysis.total_days_analyzed, 2);
    assert_eq!(analysis.total_candles_analyzed, 2880);
    println!(
        "   ✓ {} candles in alternating runs",
        analysis.total_candles_in_alternating_sequences
    );

    println!("\n=== Pipeline Test Complete ✅ ===");
}
