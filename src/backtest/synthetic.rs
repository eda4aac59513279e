use crate::models::Kline;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MINUTE_MS: i64 = 60_000;

/// Market scenario types for synthetic kline generation
#[derive(Debug, Clone, Copy)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+2% daily average)
    Uptrend,
    /// Steady downtrend with noise (-2% daily average)
    Downtrend,
    /// Strict one-minute alternation (worst case for a reversal strategy)
    Whipsaw,
    /// Calm drift with a single 6% down candle at the midpoint
    FlashCrash,
    /// Contains a 15-minute hole (missing candles)
    WithGaps,
}

/// Generates synthetic minute klines for backtesting
pub struct SyntheticKlineGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticKlineGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 0.5,
            base_volume: 50_000.0,
        }
    }

    /// Generate minute klines for a specific market scenario.
    ///
    /// `start_time_ms` is the open time of the first candle; passing it
    /// explicitly keeps runs reproducible.
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        start_time_ms: i64,
    ) -> Vec<Kline> {
        match scenario {
            MarketScenario::Uptrend => self.generate_trend(start_time_ms, num_candles, 0.02),
            MarketScenario::Downtrend => self.generate_trend(start_time_ms, num_candles, -0.02),
            MarketScenario::Whipsaw => self.generate_whipsaw(start_time_ms, num_candles),
            MarketScenario::FlashCrash => self.generate_flash_crash(start_time_ms, num_candles),
            MarketScenario::WithGaps => self.generate_with_gaps(start_time_ms, num_candles),
        }
    }

    /// Drifting market: `daily_drift` per 1440 candles, plus noise
    fn generate_trend(
        &mut self,
        start_time_ms: i64,
        num_candles: usize,
        daily_drift: f64,
    ) -> Vec<Kline> {
        let mut klines = Vec::with_capacity(num_candles);
        let mut open = self.base_price;
        let drift_per_minute = daily_drift / 1440.0;

        for i in 0..num_candles {
            let open_time = start_time_ms + i as i64 * MINUTE_MS;

            // Drift + reduced noise so the trend is dominant
            let drift = open * drift_per_minute;
            let noise = open * self.rng.gen_range(-0.0002..0.0002); // ±0.02% noise
            let close = open + drift + noise;

            klines.push(self.create_kline(open_time, open, close));
            open = close;
        }

        klines
    }

    /// Strictly alternating ±0.2% moves, starting with a down candle.
    /// An always-in reversal strategy loses on every single one.
    fn generate_whipsaw(&mut self, start_time_ms: i64, num_candles: usize) -> Vec<Kline> {
        let mut klines = Vec::with_capacity(num_candles);
        let mut open = self.base_price;

        for i in 0..num_candles {
            let open_time = start_time_ms + i as i64 * MINUTE_MS;
            let close = if i % 2 == 0 {
                open * 0.998
            } else {
                open * 1.002
            };

            klines.push(self.create_kline(open_time, open, close));
            open = close;
        }

        klines
    }

    /// Calm chop, then one candle at the midpoint whose low blows
    /// straight through a 2% stop
    fn generate_flash_crash(&mut self, start_time_ms: i64, num_candles: usize) -> Vec<Kline> {
        let mut klines = Vec::with_capacity(num_candles);
        let mut open = self.base_price;
        let crash_index = num_candles / 2;

        for i in 0..num_candles {
            let open_time = start_time_ms + i as i64 * MINUTE_MS;

            if i == crash_index {
                let low = open * 0.94;
                let close = open * 0.95;
                klines.push(self.create_kline_with_range(open_time, open, open, low, close));
                open = close;
                continue;
            }

            let noise = open * self.rng.gen_range(-0.0015..0.0015);
            let close = open + noise;
            klines.push(self.create_kline(open_time, open, close));
            open = close;
        }

        klines
    }

    /// Calm chop with a 15-minute hole in the middle, longer than the
    /// default cooldown pause
    fn generate_with_gaps(&mut self, start_time_ms: i64, num_candles: usize) -> Vec<Kline> {
        let mut klines = Vec::with_capacity(num_candles);
        let mut open = self.base_price;
        let gap_after = num_candles / 2;
        let mut slot = 0i64;

        for i in 0..num_candles {
            if i == gap_after {
                slot += 15; // 15 missing minutes
            }

            let open_time = start_time_ms + slot * MINUTE_MS;
            let noise = open * self.rng.gen_range(-0.0015..0.0015);
            let close = open + noise;

            klines.push(self.create_kline(open_time, open, close));
            open = close;
            slot += 1;
        }

        klines
    }

    /// Build a kline whose high/low wrap the open-close body with a
    /// small random wick
    fn create_kline(&mut self, open_time: i64, open: f64, close: f64) -> Kline {
        let wick_pct = 0.0005; // up to 0.05% of wick on each side
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..wick_pct));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..wick_pct));
        self.create_kline_with_range(open_time, open, high, low, close)
    }

    fn create_kline_with_range(
        &mut self,
        open_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Kline {
        // Vary volume ±30%
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Kline {
            open_time,
            open: format!("{:.6}", open),
            high: format!("{:.6}", high),
            low: format!("{:.6}", low),
            close: format!("{:.6}", close),
            volume: format!("{:.2}", volume),
        }
    }
}
