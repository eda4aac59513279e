use crate::backtest::account::SimulatedAccount;
use crate::models::TradeRecord;
use serde::{Deserialize, Serialize};

/// Summary of a completed run plus the full trade ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_percent: f64,
    pub pause_count: u32,
    pub trades: Vec<TradeRecord>,
}

impl BacktestReport {
    /// Build the summary from a settled account
    pub fn from_account(initial_equity: f64, account: SimulatedAccount) -> Self {
        let total_trades = account.trades.len();
        let winning_trades = account.trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate_percent = if total_trades > 0 {
            (winning_trades as f64 / total_trades as f64) * 100.0
        } else {
            0.0
        };

        Self {
            initial_equity,
            final_equity: account.equity,
            total_pnl: account.equity - initial_equity,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate_percent,
            pause_count: account.pause_count,
            trades: account.trades,
        }
    }

    /// Print a formatted summary to stdout
    pub fn print_summary(&self) {
        println!("\n--- Backtest Summary ---");
        println!("  Initial equity:  {:.2} USD", self.initial_equity);
        println!("  Final equity:    {:.2} USD", self.final_equity);
        println!("  Total PnL:       {:+.2} USD", self.total_pnl);
        println!("  Total trades:    {}", self.total_trades);
        println!("  Winning trades:  {}", self.winning_trades);
        println!("  Losing trades:   {}", self.losing_trades);
        println!("  Win rate:        {:.2}%", self.win_rate_percent);
        println!("  Cooldown pauses: {}", self.pause_count);
        println!("------------------------\n");
    }
}
