//! Symbol category classifier and per-category factor weight tables.
//!
//! Symbols map to one of four liquidity/market-cap categories from static
//! membership tables; unknown symbols fall back to [`Category::Hot`]. Each
//! category carries factor-weight tables for four scoring contexts
//! (trend/range market × 1H/15M), all summing to 1.0.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{MarketType, Timeframe};

/// Scoring factors referenced by the weight tables and the adaptive learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Price-vs-VWAP side agreement.
    Vwap,
    /// EMA/key-level breakout confirmation.
    Breakout,
    /// Volume expansion (trend) or contraction (range).
    Volume,
    /// Open-interest rate of change.
    OiChange,
    /// Buy/sell volume imbalance.
    Delta,
    /// Funding-rate neutrality.
    Funding,
    /// Boundary touch count (range only).
    Touch,
    /// Absence of a recent breakout (range only).
    NoBreakout,
}

impl Factor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vwap => "vwap",
            Self::Breakout => "breakout",
            Self::Volume => "volume",
            Self::OiChange => "oi_change",
            Self::Delta => "delta",
            Self::Funding => "funding",
            Self::Touch => "touch",
            Self::NoBreakout => "no_breakout",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Liquidity/market-cap tier of a symbol.
///
/// Immutable for the process lifetime; changes only via table edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// High-liquidity majors.
    Mainstream,
    /// High-cap coins with strong trending behaviour.
    HighCapTrend,
    /// Hot / mid-cap coins. Default for unknown symbols.
    Hot,
    /// Small-cap, low-liquidity coins.
    SmallCap,
}

const MAINSTREAM_SYMBOLS: &[&str] = &["BTCUSDT", "ETHUSDT", "BNBUSDT"];

const HIGH_CAP_TREND_SYMBOLS: &[&str] = &[
    "SOLUSDT", "ADAUSDT", "XRPUSDT", "DOGEUSDT", "DOTUSDT", "LTCUSDT", "TRXUSDT", "BCHUSDT",
    "ETCUSDT",
];

const HOT_SYMBOLS: &[&str] = &[
    "PEPEUSDT", "APTUSDT", "PENDLEUSDT", "LINKUSDT", "MKRUSDT", "SUIUSDT",
];

const SMALL_CAP_SYMBOLS: &[&str] = &["ONDOUSDT", "LDOUSDT", "MPLUSDT"];

impl Category {
    /// Classify a symbol against the static membership tables.
    ///
    /// Unmatched symbols default to `Hot`: a documented fallback, not an
    /// error.
    #[must_use]
    pub fn classify(symbol: &str) -> Self {
        if MAINSTREAM_SYMBOLS.contains(&symbol) {
            Self::Mainstream
        } else if HIGH_CAP_TREND_SYMBOLS.contains(&symbol) {
            Self::HighCapTrend
        } else if HOT_SYMBOLS.contains(&symbol) {
            Self::Hot
        } else if SMALL_CAP_SYMBOLS.contains(&symbol) {
            Self::SmallCap
        } else {
            Self::Hot
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainstream => "mainstream",
            Self::HighCapTrend => "high_cap_trend",
            Self::Hot => "hot",
            Self::SmallCap => "small_cap",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Weight tables
// ═══════════════════════════════════════════════════════════════════════════
//
// Each table sums to 1.0 (checked in tests). VWAP carries no weight in the
// trend-market 1H context: it is a hard gate there, not a scored factor.

pub type WeightRow = &'static [(Factor, Decimal)];

const TREND_H1_MAINSTREAM: WeightRow = &[
    (Factor::Breakout, dec!(0.30)),
    (Factor::Volume, dec!(0.20)),
    (Factor::OiChange, dec!(0.25)),
    (Factor::Delta, dec!(0.15)),
    (Factor::Funding, dec!(0.10)),
];

const TREND_H1_HIGH_CAP: WeightRow = &[
    (Factor::Breakout, dec!(0.25)),
    (Factor::Volume, dec!(0.25)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Delta, dec!(0.20)),
    (Factor::Funding, dec!(0.10)),
];

const TREND_H1_HOT: WeightRow = &[
    (Factor::Breakout, dec!(0.15)),
    (Factor::Volume, dec!(0.30)),
    (Factor::OiChange, dec!(0.15)),
    (Factor::Delta, dec!(0.30)),
    (Factor::Funding, dec!(0.10)),
];

const TREND_H1_SMALL_CAP: WeightRow = &[
    (Factor::Breakout, dec!(0.15)),
    (Factor::Volume, dec!(0.35)),
    (Factor::OiChange, dec!(0.15)),
    (Factor::Delta, dec!(0.25)),
    (Factor::Funding, dec!(0.10)),
];

const RANGE_H1_MAINSTREAM: WeightRow = &[
    (Factor::Vwap, dec!(0.20)),
    (Factor::Touch, dec!(0.30)),
    (Factor::Volume, dec!(0.20)),
    (Factor::Delta, dec!(0.15)),
    (Factor::OiChange, dec!(0.10)),
    (Factor::NoBreakout, dec!(0.05)),
];

const RANGE_H1_HIGH_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.20)),
    (Factor::Touch, dec!(0.30)),
    (Factor::Volume, dec!(0.25)),
    (Factor::Delta, dec!(0.15)),
    (Factor::OiChange, dec!(0.10)),
];

const RANGE_H1_HOT: WeightRow = &[
    (Factor::Vwap, dec!(0.10)),
    (Factor::Touch, dec!(0.25)),
    (Factor::Volume, dec!(0.30)),
    (Factor::Delta, dec!(0.25)),
    (Factor::OiChange, dec!(0.10)),
];

const RANGE_H1_SMALL_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.10)),
    (Factor::Touch, dec!(0.25)),
    (Factor::Volume, dec!(0.30)),
    (Factor::Delta, dec!(0.25)),
    (Factor::OiChange, dec!(0.10)),
];

const TREND_M15_MAINSTREAM: WeightRow = &[
    (Factor::Vwap, dec!(0.40)),
    (Factor::Delta, dec!(0.20)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.20)),
];

const TREND_M15_HIGH_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.35)),
    (Factor::Delta, dec!(0.25)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.20)),
];

const TREND_M15_HOT: WeightRow = &[
    (Factor::Vwap, dec!(0.30)),
    (Factor::Delta, dec!(0.25)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.25)),
];

const TREND_M15_SMALL_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.25)),
    (Factor::Delta, dec!(0.25)),
    (Factor::OiChange, dec!(0.15)),
    (Factor::Volume, dec!(0.35)),
];

const RANGE_M15_MAINSTREAM: WeightRow = &[
    (Factor::Vwap, dec!(0.30)),
    (Factor::Delta, dec!(0.30)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.20)),
];

const RANGE_M15_HIGH_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.20)),
    (Factor::Delta, dec!(0.30)),
    (Factor::OiChange, dec!(0.30)),
    (Factor::Volume, dec!(0.20)),
];

const RANGE_M15_HOT: WeightRow = &[
    (Factor::Vwap, dec!(0.20)),
    (Factor::Delta, dec!(0.20)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.40)),
];

const RANGE_M15_SMALL_CAP: WeightRow = &[
    (Factor::Vwap, dec!(0.10)),
    (Factor::Delta, dec!(0.20)),
    (Factor::OiChange, dec!(0.20)),
    (Factor::Volume, dec!(0.50)),
];

/// Factor weights for `(category, market_type, timeframe)`.
///
/// The 15M tables apply only to `Timeframe::M15`; every other timeframe uses
/// the 1H tables.
#[must_use]
pub fn weights(category: Category, market_type: MarketType, timeframe: Timeframe) -> WeightRow {
    match (market_type, timeframe, category) {
        (MarketType::Trend, Timeframe::M15, Category::Mainstream) => TREND_M15_MAINSTREAM,
        (MarketType::Trend, Timeframe::M15, Category::HighCapTrend) => TREND_M15_HIGH_CAP,
        (MarketType::Trend, Timeframe::M15, Category::Hot) => TREND_M15_HOT,
        (MarketType::Trend, Timeframe::M15, Category::SmallCap) => TREND_M15_SMALL_CAP,
        (MarketType::Range, Timeframe::M15, Category::Mainstream) => RANGE_M15_MAINSTREAM,
        (MarketType::Range, Timeframe::M15, Category::HighCapTrend) => RANGE_M15_HIGH_CAP,
        (MarketType::Range, Timeframe::M15, Category::Hot) => RANGE_M15_HOT,
        (MarketType::Range, Timeframe::M15, Category::SmallCap) => RANGE_M15_SMALL_CAP,
        (MarketType::Trend, _, Category::Mainstream) => TREND_H1_MAINSTREAM,
        (MarketType::Trend, _, Category::HighCapTrend) => TREND_H1_HIGH_CAP,
        (MarketType::Trend, _, Category::Hot) => TREND_H1_HOT,
        (MarketType::Trend, _, Category::SmallCap) => TREND_H1_SMALL_CAP,
        (MarketType::Range, _, Category::Mainstream) => RANGE_H1_MAINSTREAM,
        (MarketType::Range, _, Category::HighCapTrend) => RANGE_H1_HIGH_CAP,
        (MarketType::Range, _, Category::Hot) => RANGE_H1_HOT,
        (MarketType::Range, _, Category::SmallCap) => RANGE_H1_SMALL_CAP,
    }
}

/// Weighted score for boolean factor outcomes against a weight row.
///
/// Unknown factors (not present in the row) contribute nothing.
#[must_use]
pub fn weighted_score(row: &[(Factor, Decimal)], outcomes: &[(Factor, bool)]) -> Decimal {
    outcomes
        .iter()
        .filter(|(_, passed)| *passed)
        .filter_map(|(factor, _)| {
            row.iter()
                .find(|(f, _)| f == factor)
                .map(|(_, weight)| *weight)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_rows() -> Vec<(&'static str, WeightRow)> {
        let mut rows = Vec::new();
        for category in [
            Category::Mainstream,
            Category::HighCapTrend,
            Category::Hot,
            Category::SmallCap,
        ] {
            for market_type in [MarketType::Trend, MarketType::Range] {
                for timeframe in [Timeframe::H1, Timeframe::M15] {
                    rows.push((category.as_str(), weights(category, market_type, timeframe)));
                }
            }
        }
        rows
    }

    #[test]
    fn test_all_weight_tables_sum_to_one() {
        for (name, row) in all_rows() {
            let total: Decimal = row.iter().map(|(_, w)| *w).sum();
            assert_eq!(total, dec!(1.0), "weights for {name} must sum to 1.0");
        }
    }

    #[test]
    fn test_classify_membership() {
        for &symbol in MAINSTREAM_SYMBOLS {
            assert_eq!(Category::classify(symbol), Category::Mainstream);
        }
        for &symbol in HIGH_CAP_TREND_SYMBOLS {
            assert_eq!(Category::classify(symbol), Category::HighCapTrend);
        }
        for &symbol in HOT_SYMBOLS {
            assert_eq!(Category::classify(symbol), Category::Hot);
        }
        for &symbol in SMALL_CAP_SYMBOLS {
            assert_eq!(Category::classify(symbol), Category::SmallCap);
        }
    }

    #[test]
    fn test_classify_unknown_defaults_to_hot() {
        assert_eq!(Category::classify("NOPEUSDT"), Category::Hot);
        assert_eq!(Category::classify(""), Category::Hot);
    }

    #[test]
    fn test_trend_h1_has_no_vwap_weight() {
        for category in [
            Category::Mainstream,
            Category::HighCapTrend,
            Category::Hot,
            Category::SmallCap,
        ] {
            let row = weights(category, MarketType::Trend, Timeframe::H1);
            assert!(
                row.iter().all(|(f, _)| *f != Factor::Vwap),
                "VWAP is a hard gate in trend 1H, not a weighted factor"
            );
        }
    }

    #[test]
    fn test_weighted_score_partial_pass() {
        let row = weights(Category::Mainstream, MarketType::Trend, Timeframe::H1);
        let score = weighted_score(
            row,
            &[
                (Factor::Breakout, true),
                (Factor::Volume, false),
                (Factor::OiChange, true),
            ],
        );
        assert_eq!(score, dec!(0.55)); // 0.30 + 0.25
    }

    #[test]
    fn test_weighted_score_unknown_factor_ignored() {
        let row = weights(Category::Mainstream, MarketType::Trend, Timeframe::M15);
        let score = weighted_score(row, &[(Factor::Touch, true)]);
        assert_eq!(score, Decimal::ZERO);
    }
}
