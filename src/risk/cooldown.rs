/// Loss-streak cooldown state, threaded through the backtest loop.
///
/// After enough consecutive losing trades the engine stops opening
/// positions until a wall-clock timestamp has passed. The pause is a
/// plain timestamp gate, so it carries across day-file boundaries and
/// a data gap longer than the pause simply means the next candle is
/// already eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CooldownState {
    pub consecutive_losses: u32,
    /// Epoch ms. Candles opening strictly before this are skipped;
    /// a candle opening exactly at it trades again. 0 means no pause.
    pub pause_until: i64,
}

impl CooldownState {
    /// Whether a candle opening at `open_time` falls inside the pause
    /// window
    pub fn is_paused_at(&self, open_time: i64) -> bool {
        open_time < self.pause_until
    }

    /// Update the streak after a settled trade.
    ///
    /// A win resets the streak. A loss increments it, and when the
    /// streak reaches `losses_before_pause` the pause is armed from the
    /// triggering candle's open time and the streak resets immediately,
    /// so the next loss starts a fresh count of one. Returns the pause
    /// expiry when this outcome armed a new pause.
    pub fn record_outcome(
        &mut self,
        won: bool,
        open_time: i64,
        losses_before_pause: u32,
        pause_duration_ms: i64,
    ) -> Option<i64> {
        if won {
            self.consecutive_losses = 0;
            return None;
        }

        self.consecutive_losses += 1;
        if self.consecutive_losses >= losses_before_pause {
            self.pause_until = open_time + pause_duration_ms;
            self.consecutive_losses = 0;
            return Some(self.pause_until);
        }

        None
    }
}
