use crate::models::TradeRecord;

/// Paper account the engine settles trades into. Equity only ever
/// changes by recorded trade PnL, so final equity always equals the
/// initial equity plus the ledger sum.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAccount {
    pub equity: f64,
    pub trades: Vec<TradeRecord>,
    pub pause_count: u32,
}

impl SimulatedAccount {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            equity: initial_equity,
            trades: Vec::new(),
            pause_count: 0,
        }
    }

    /// Append a settled trade and apply its net PnL
    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.equity += trade.pnl;
        self.trades.push(trade);
    }

    pub fn record_pause(&mut self) {
        self.pause_count += 1;
    }
}
