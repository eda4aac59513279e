use klinebot::backtest::{
    BacktestConfig, BacktestEngine, BacktestReport, MarketScenario, SyntheticKlineGenerator,
};
use klinebot::Result;

const SEED: u64 = 42;
const START_MS: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z
const CANDLES: usize = 1440; // one full day per scenario

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("klinebot=warn")
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║            KLINEBOT SCENARIO SUITE                    ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let engine = BacktestEngine::new(BacktestConfig::default())?;

    // Test scenarios
    let scenarios = vec![
        (MarketScenario::Uptrend, "📈 Uptrend (+2% daily)"),
        (MarketScenario::Downtrend, "📉 Downtrend (-2% daily)"),
        (MarketScenario::Whipsaw, "🪚 Whipsaw (strict alternation)"),
        (MarketScenario::FlashCrash, "💥 Flash Crash (6% candle)"),
        (MarketScenario::WithGaps, "🕳️  With Time Gaps"),
    ];

    let mut all_reports = Vec::new();

    for (scenario, name) in scenarios {
        // Generate one synthetic trading day
        let mut generator = SyntheticKlineGenerator::new(SEED);
        let day = generator.generate(scenario, CANDLES, START_MS);

        match engine.run(&[day]) {
            Ok(report) => {
                all_reports.push((name.to_string(), report));
            }
            Err(e) => {
                eprintln!("❌ Backtest failed for {}: {}", name, e);
            }
        }
    }

    // Summary comparison
    print_summary_comparison(&all_reports);

    Ok(())
}

fn print_summary_comparison(results: &[(String, BacktestReport)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<32} {:>10} {:>8} {:>8} {:>8}",
        "Scenario", "P&L", "Trades", "Win%", "Pauses"
    );
    println!("{}", "─".repeat(70));

    for (name, report) in results {
        println!(
            "{:<32} {:>10.2} {:>8} {:>8.1} {:>8}",
            name,
            report.total_pnl,
            report.total_trades,
            report.win_rate_percent,
            report.pause_count
        );
    }

    println!();

    // Find best/worst
    if let Some((best_name, best)) = results
        .iter()
        .max_by(|a, b| a.1.total_pnl.partial_cmp(&b.1.total_pnl).unwrap())
    {
        println!("🏆 Best Scenario: {} ({:+.2})", best_name, best.total_pnl);
    }

    if let Some((worst_name, worst)) = results
        .iter()
        .min_by(|a, b| a.1.total_pnl.partial_cmp(&b.1.total_pnl).unwrap())
    {
        println!("⚠️  Worst Scenario: {} ({:+.2})", worst_name, worst.total_pnl);
    }

    // Overall statistics
    let total_trades: usize = results.iter().map(|(_, r)| r.total_trades).sum();
    let total_pauses: u32 = results.iter().map(|(_, r)| r.pause_count).sum();

    println!("\n📊 Overall Statistics:");
    println!("   Total Trades Across All Scenarios: {}", total_trades);
    println!("   Cooldown Pauses Triggered: {}", total_pauses);

    println!("\n═══════════════════════════════════════════════════════\n");
}
