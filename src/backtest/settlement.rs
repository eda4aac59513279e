use crate::models::{KlinePrices, PositionSide};

/// Outcome of settling one trade against one candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub exit_price: f64,
    /// Net of fees on both legs
    pub pnl: f64,
}

/// Settle a fixed-notional trade opened at the candle open and closed
/// within the same candle.
///
/// The stop is checked against the candle extreme for the trade
/// direction; when it is touched the exit fills exactly at the stop
/// price, even if the close finished beyond it. Otherwise the trade
/// exits at the close. Fees are charged at the same rate on the entry
/// and the exit notional.
pub fn settle(
    side: PositionSide,
    prices: KlinePrices,
    position_size_usd: f64,
    stop_loss_fraction: f64,
    fee_rate: f64,
) -> Settlement {
    let quantity = position_size_usd / prices.open;

    let (exit_price, gross) = match side {
        PositionSide::Long => {
            let stop = prices.open * (1.0 - stop_loss_fraction);
            let exit = if prices.low <= stop {
                stop
            } else {
                prices.close
            };
            (exit, (exit - prices.open) * quantity)
        }
        PositionSide::Short => {
            let stop = prices.open * (1.0 + stop_loss_fraction);
            let exit = if prices.high >= stop {
                stop
            } else {
                prices.close
            };
            (exit, (prices.open - exit) * quantity)
        }
    };

    let fees = prices.open * quantity * fee_rate + exit_price * quantity * fee_rate;

    Settlement {
        exit_price,
        pnl: gross - fees,
    }
}
