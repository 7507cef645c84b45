//! Timeframe, market-type and confidence-tier types.
//!
//! Three candle granularities are scored: the macro trend window (4H), the
//! mid confirmation window (1H) and the micro entry-trigger window (15M).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle granularities consumed by the scoring pipeline.
///
/// Ordered from shortest to longest for iteration purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// 15-minute candles (entry trigger)
    M15,
    /// 1-hour candles (factor confirmation)
    H1,
    /// 4-hour candles (trend context)
    H4,
}

impl Timeframe {
    /// All timeframes in ascending order.
    pub const ALL: [Timeframe; 3] = [Timeframe::M15, Timeframe::H1, Timeframe::H4];

    /// Exchange kline interval string representation.
    #[must_use]
    pub fn as_interval(&self) -> &'static str {
        match self {
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
        }
    }

    /// Parse from an exchange interval string.
    #[must_use]
    pub fn from_interval(s: &str) -> Option<Self> {
        match s {
            "15m" => Some(Self::M15),
            "1h" => Some(Self::H1),
            "4h" => Some(Self::H4),
            _ => None,
        }
    }

    /// Duration in seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        match self {
            Self::M15 => 900,
            Self::H1 => 3600,
            Self::H4 => 14400,
        }
    }

    /// Minimum candle count the scorer for this timeframe requires.
    ///
    /// Below this the scorer degrades to an explicit insufficient-data
    /// result instead of failing the pipeline.
    #[must_use]
    pub const fn min_candles(&self) -> usize {
        match self {
            Self::M15 => 15,
            Self::H1 => 50,
            Self::H4 => 200,
        }
    }

    /// Candle count requested from the market-data source.
    #[must_use]
    pub const fn fetch_candles(&self) -> usize {
        match self {
            Self::M15 => 50,
            Self::H1 => 50,
            Self::H4 => 250,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_interval())
    }
}

/// Market regime as classified by the macro trend scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    /// Directional market: trend-continuation entries.
    Trend,
    /// Sideways market: boundary fake-breakout entries.
    Range,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Range => "range",
        }
    }
}

/// Confidence tier controlling stop/target width and reward:risk floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    #[default]
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Stop/target width multiplier. Lower confidence widens both legs
    /// proportionally.
    #[must_use]
    pub fn width_multiplier(&self) -> Decimal {
        match self {
            Self::High => dec!(1.0),
            Self::Medium => dec!(1.2),
            Self::Low => dec!(1.5),
        }
    }

    /// Classify a scorer confidence value in [0, 1] into a tier.
    #[must_use]
    pub fn from_confidence(confidence: Decimal) -> Self {
        if confidence >= dec!(0.7) {
            Self::High
        } else if confidence >= dec!(0.5) {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}
