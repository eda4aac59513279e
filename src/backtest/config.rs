use serde::{Deserialize, Serialize};

/// Engine configuration. Defaults are the production constants the
/// strategy was tuned with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacktestConfig {
    pub initial_equity: f64,
    pub position_size_usd: f64,
    pub stop_loss_fraction: f64,
    pub fee_rate: f64,
    pub losses_before_pause: u32,
    pub pause_duration_ms: i64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_equity: 1000.0,
            position_size_usd: 100.0,          // Fixed notional per trade
            stop_loss_fraction: 0.02,          // 2% from entry
            fee_rate: 0.0005,                  // 0.05% per leg, both legs
            losses_before_pause: 4,            // Streak length that pauses trading
            pause_duration_ms: 10 * 60 * 1000, // 10 minutes
        }
    }
}

impl BacktestConfig {
    /// Reject unusable configurations before any candle is touched
    pub fn validate(&self) -> crate::Result<()> {
        if !self.initial_equity.is_finite() {
            return Err(format!(
                "initialEquity must be finite, got {}",
                self.initial_equity
            )
            .into());
        }
        if !self.position_size_usd.is_finite() || self.position_size_usd <= 0.0 {
            return Err(format!(
                "positionSizeUsd must be positive, got {}",
                self.position_size_usd
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.stop_loss_fraction) {
            return Err(format!(
                "stopLossFraction must be within [0, 1], got {}",
                self.stop_loss_fraction
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.fee_rate) {
            return Err(format!("feeRate must be within [0, 1], got {}", self.fee_rate).into());
        }
        if self.losses_before_pause == 0 {
            return Err("lossesBeforePause must be at least 1".into());
        }
        if self.pause_duration_ms < 0 {
            return Err(format!(
                "pauseDurationMs must not be negative, got {}",
                self.pause_duration_ms
            )
            .into());
        }
        Ok(())
    }
}
