use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle.
///
/// Series are ordered by strictly increasing `open_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time in epoch milliseconds.
    pub open_time: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
}

/// One point of the open-interest history series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterestPoint {
    pub timestamp: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub sum_open_interest: Decimal,
}

/// 24-hour rolling ticker statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker24h {
    #[serde(with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
}

/// Optional derived market statistics attached to an evaluation.
///
/// Every field may be absent; absence zeroes the affected sub-factor
/// rather than failing the scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuxiliaryData {
    /// Most recent perpetual funding rate (e.g. `0.0001` = 1 bp).
    pub funding_rate: Option<Decimal>,
    /// Open-interest history, ascending by timestamp.
    #[serde(default)]
    pub open_interest: Vec<OpenInterestPoint>,
    /// 24h ticker snapshot.
    pub ticker: Option<Ticker24h>,
}
