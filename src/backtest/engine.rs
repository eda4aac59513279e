use crate::backtest::account::SimulatedAccount;
use crate::backtest::config::BacktestConfig;
use crate::backtest::report::BacktestReport;
use crate::backtest::settlement::{settle, Settlement};
use crate::models::{Kline, PositionSide, TradeRecord};
use crate::risk::CooldownState;
use crate::strategy::{next_side, trade_won};
use crate::Result;

/// Strategy state carried from candle to candle, including across day
/// files
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    pub side: PositionSide,
    pub cooldown: CooldownState,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            side: PositionSide::Long,
            cooldown: CooldownState::default(),
        }
    }
}

/// What one step produced besides the next state
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub trade: TradeRecord,
    /// Pause expiry when this trade's loss armed a cooldown
    pub pause_until: Option<i64>,
}

/// Advance the state machine by one candle.
///
/// A candle inside the pause window is skipped without being parsed
/// and returns the state unchanged. Every other candle settles exactly
/// one trade: the win/loss classification is computed once and drives
/// both the next side and the loss streak.
pub fn step(
    state: EngineState,
    kline: &Kline,
    config: &BacktestConfig,
) -> Result<(EngineState, Option<StepOutcome>)> {
    if state.cooldown.is_paused_at(kline.open_time) {
        return Ok((state, None));
    }

    let prices = kline.prices()?;
    let Settlement { exit_price, pnl } = settle(
        state.side,
        prices,
        config.position_size_usd,
        config.stop_loss_fraction,
        config.fee_rate,
    );

    let trade = TradeRecord {
        side: state.side,
        entry_price: prices.open,
        exit_price,
        pnl,
        timestamp: kline.open_time,
    };

    let won = trade_won(pnl);
    let mut next = state;
    next.side = next_side(state.side, won);
    let pause_until = next.cooldown.record_outcome(
        won,
        kline.open_time,
        config.losses_before_pause,
        config.pause_duration_ms,
    );

    Ok((next, Some(StepOutcome { trade, pause_until })))
}

/// Receives engine events during a run. The engine itself never prints
/// or logs; callers decide what surfaces.
pub trait BacktestObserver {
    fn on_trade(&mut self, _trade: &TradeRecord, _equity: f64) {}
    fn on_pause(&mut self, _triggered_at: i64, _pause_until: i64) {}
}

/// Observer that drops every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl BacktestObserver for NoopObserver {}

/// Observer that forwards engine events to tracing
#[derive(Debug, Default)]
pub struct LogObserver;

impl BacktestObserver for LogObserver {
    fn on_trade(&mut self, trade: &TradeRecord, equity: f64) {
        tracing::debug!(
            "{:?} @ {:.6} -> {:.6} | pnl {:+.4} | equity {:.4}",
            trade.side,
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            equity
        );
    }

    fn on_pause(&mut self, triggered_at: i64, pause_until: i64) {
        tracing::info!(
            "⏸️  Loss streak hit at {}, trading resumes at {}",
            format_ts(triggered_at),
            format_ts(pause_until)
        );
    }
}

fn format_ts(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Deterministic sequential backtest over day files of minute candles.
/// Same candles and config in, byte-identical report out.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create an engine, rejecting invalid configurations up front
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run over day files in the order given. Callers pass days sorted
    /// by filename, which is chronological; state carries across the
    /// day boundaries.
    pub fn run(&self, days: &[Vec<Kline>]) -> Result<BacktestReport> {
        self.run_with_observer(days, &mut NoopObserver)
    }

    /// Same as [`run`](Self::run) with engine events forwarded to an
    /// observer
    pub fn run_with_observer(
        &self,
        days: &[Vec<Kline>],
        observer: &mut dyn BacktestObserver,
    ) -> Result<BacktestReport> {
        let total_candles: usize = days.iter().map(|day| day.len()).sum();
        if total_candles == 0 {
            return Err(format!("No candles to backtest across {} day files", days.len()).into());
        }

        let mut account = SimulatedAccount::new(self.config.initial_equity);
        let mut state = EngineState::default();

        for day in days {
            for kline in day {
                let (next, outcome) = step(state, kline, &self.config)?;
                state = next;

                if let Some(StepOutcome { trade, pause_until }) = outcome {
                    // Trade first, pause second: the trigger candle's
                    // own trade still counts
                    account.record_trade(trade.clone());
                    observer.on_trade(&trade, account.equity);

                    if let Some(until) = pause_until {
                        account.record_pause();
                        observer.on_pause(kline.open_time, until);
                    }
                }
            }
        }

        Ok(BacktestReport::from_account(
            self.config.initial_equity,
            account,
        ))
    }
}
