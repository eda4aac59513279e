use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single minute candle as the exchange kline endpoint returns it and
/// as day files persist it. Prices stay decimal strings until the
/// engine needs them as numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

/// Numeric view of a kline's price fields after validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlinePrices {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A price field that failed validation, reported with the candle it
/// came from so a bad day file can be pinned down immediately
#[derive(Debug, Error, Clone, PartialEq)]
#[error("candle at {open_time}: {field} price {value:?} is not a finite number")]
pub struct InvalidPrice {
    pub open_time: i64,
    pub field: &'static str,
    pub value: String,
}

impl Kline {
    /// Parse the four price fields, rejecting anything that is not a
    /// finite number (including "NaN" and "inf", which `f64` would
    /// otherwise happily accept)
    pub fn prices(&self) -> Result<KlinePrices, InvalidPrice> {
        Ok(KlinePrices {
            open: self.price_field("open", &self.open)?,
            high: self.price_field("high", &self.high)?,
            low: self.price_field("low", &self.low)?,
            close: self.price_field("close", &self.close)?,
        })
    }

    fn price_field(&self, field: &'static str, value: &str) -> Result<f64, InvalidPrice> {
        match value.parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(price),
            _ => Err(InvalidPrice {
                open_time: self.open_time,
                field,
                value: value.to_string(),
            }),
        }
    }
}

/// Direction of a simulated position. The exchange wire format calls
/// these BUY and SELL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionSide {
    #[serde(rename = "BUY")]
    Long,
    #[serde(rename = "SELL")]
    Short,
}

impl PositionSide {
    pub fn flipped(self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }
}

/// Ledger entry for one settled trade. `side` is the side the trade
/// was executed with, `timestamp` is the candle open time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub side: PositionSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub timestamp: i64,
}
