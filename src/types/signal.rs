use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::timeframe::{ConfidenceTier, MarketType, Timeframe};

/// Direction read from the macro trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Range,
}

impl TrendDirection {
    /// Market type implied by this direction.
    #[must_use]
    pub fn market_type(&self) -> MarketType {
        match self {
            Self::Up | Self::Down => MarketType::Trend,
            Self::Range => MarketType::Range,
        }
    }
}

/// Final directional trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    /// Macro scorer failed; direction is unknown.
    Error,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Error => "ERROR",
        }
    }

    /// Whether this signal opens a position.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

/// How a micro-timeframe entry was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Classic trend-continuation trigger on the micro window.
    TrendContinuation,
    /// False-breakout-and-reclaim of a validated range boundary.
    RangeReclaim,
}

/// Snapshot of the macro-window indicators backing a trend read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendSnapshot {
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ma20: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ma50: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ma200: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub adx: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub di_plus: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub di_minus: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub band_width: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub vwap: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub macd_histogram: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub atr: Decimal,
}

/// Macro (4H) scorer output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub timeframe: Timeframe,
    pub direction: TrendDirection,
    pub market_type: MarketType,
    /// Bounded score in [0, 10].
    #[serde(with = "rust_decimal::serde::str")]
    pub score: Decimal,
    /// Confidence in [0, 1].
    #[serde(with = "rust_decimal::serde::str")]
    pub confidence: Decimal,
    pub snapshot: TrendSnapshot,
    pub error: Option<String>,
}

impl TrendAnalysis {
    /// Degraded result used when the macro series is too short or the
    /// computation failed.
    #[must_use]
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            timeframe: Timeframe::H4,
            direction: TrendDirection::Range,
            market_type: MarketType::Range,
            score: Decimal::ZERO,
            confidence: Decimal::ZERO,
            snapshot: TrendSnapshot::default(),
            error: Some(error.into()),
        }
    }
}

/// Per-factor pass flags from the mid (1H) scorer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FactorFlags {
    pub vwap: bool,
    pub breakout: bool,
    pub volume: bool,
    pub oi_change: bool,
    pub funding: bool,
    pub delta: bool,
}

/// Mid (1H) scorer output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorAnalysis {
    pub timeframe: Timeframe,
    /// Raw pass count in [0, 6]; this is what the fusion engine consumes.
    #[serde(with = "rust_decimal::serde::str")]
    pub score: Decimal,
    /// Category-weighted score in [0, 1].
    #[serde(with = "rust_decimal::serde::str")]
    pub weighted_score: Decimal,
    /// Whether price sits on the trend side of VWAP (hard gate in trend mode).
    pub vwap_aligned: bool,
    pub factors: FactorFlags,
    #[serde(with = "rust_decimal::serde::str")]
    pub vwap: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delta: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub oi_change: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub funding_rate: Decimal,
    pub error: Option<String>,
}

impl FactorAnalysis {
    #[must_use]
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            timeframe: Timeframe::H1,
            score: Decimal::ZERO,
            weighted_score: Decimal::ZERO,
            vwap_aligned: false,
            factors: FactorFlags::default(),
            vwap: Decimal::ZERO,
            delta: Decimal::ZERO,
            oi_change: Decimal::ZERO,
            funding_rate: Decimal::ZERO,
            error: Some(error.into()),
        }
    }
}

/// Micro (15M) scorer output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionAnalysis {
    pub timeframe: Timeframe,
    pub signal: Signal,
    /// Bounded score in [0, 5].
    #[serde(with = "rust_decimal::serde::str")]
    pub score: Decimal,
    /// Price-structure score in [0, 2] (HH/HL or LL/LH sequences).
    #[serde(with = "rust_decimal::serde::str")]
    pub structure_score: Decimal,
    /// Confidence in [0, 1].
    #[serde(with = "rust_decimal::serde::str")]
    pub confidence: Decimal,
    pub tier: ConfidenceTier,
    /// Set when the signal carries a concrete trigger.
    pub entry_mode: Option<EntryMode>,
    /// Entry/stop/target proposed by a range-reclaim trigger, zero otherwise.
    #[serde(with = "rust_decimal::serde::str")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_loss: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub take_profit: Decimal,
    /// Micro-window ATR (sizing fallback when the macro ATR is unusable).
    #[serde(with = "rust_decimal::serde::str")]
    pub atr: Decimal,
    pub error: Option<String>,
}

impl ExecutionAnalysis {
    #[must_use]
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            timeframe: Timeframe::M15,
            signal: Signal::Hold,
            score: Decimal::ZERO,
            structure_score: Decimal::ZERO,
            confidence: Decimal::ZERO,
            tier: ConfidenceTier::Low,
            entry_mode: None,
            entry_price: Decimal::ZERO,
            stop_loss: Decimal::ZERO,
            take_profit: Decimal::ZERO,
            atr: Decimal::ZERO,
            error: Some(error.into()),
        }
    }
}

/// Per-tier mid-score acceptance thresholds after adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(with = "rust_decimal::serde::str")]
    pub strong: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub moderate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub weak: Decimal,
}

/// Inter-timeframe blend weights used for one fusion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendWeights {
    #[serde(with = "rust_decimal::serde::str")]
    pub trend: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub factor: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub entry: Decimal,
}

/// Fusion engine output. Recomputed on every evaluation; no stored state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionDecision {
    pub signal: Signal,
    /// Blended score normalized to an integer percentage [0, 100].
    pub normalized_score: i64,
    /// Additive bonus for exceptionally strong single dimensions, capped.
    #[serde(with = "rust_decimal::serde::str")]
    pub compensation: Decimal,
    pub thresholds: TierThresholds,
    pub weights: BlendWeights,
    pub tier: Option<ConfidenceTier>,
}

/// Bounded position-sizing parameters for an accepted signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeParameters {
    #[serde(with = "rust_decimal::serde::str")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_loss: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub take_profit: Decimal,
    pub leverage: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin: Decimal,
    pub time_stop_minutes: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_duration_hours: Decimal,
}

impl TradeParameters {
    /// All-zero parameters: sizing failed, signal is non-actionable.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            entry_price: Decimal::ZERO,
            stop_loss: Decimal::ZERO,
            take_profit: Decimal::ZERO,
            leverage: 0,
            margin: Decimal::ZERO,
            time_stop_minutes: 0,
            max_duration_hours: Decimal::ZERO,
        }
    }
}

/// Full evaluation output for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyEvaluation {
    pub symbol: String,
    pub signal: Signal,
    pub market_type: MarketType,
    pub trend: TrendAnalysis,
    pub factors: FactorAnalysis,
    pub execution: ExecutionAnalysis,
    pub decision: Option<FusionDecision>,
    pub params: TradeParameters,
    pub error: Option<String>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_market_type() {
        assert_eq!(TrendDirection::Up.market_type(), MarketType::Trend);
        assert_eq!(TrendDirection::Down.market_type(), MarketType::Trend);
        assert_eq!(TrendDirection::Range.market_type(), MarketType::Range);
    }

    #[test]
    fn test_signal_actionable() {
        assert!(Signal::Buy.is_actionable());
        assert!(Signal::Sell.is_actionable());
        assert!(!Signal::Hold.is_actionable());
        assert!(!Signal::Error.is_actionable());
    }

    #[test]
    fn test_degraded_trend_is_neutral() {
        let t = TrendAnalysis::degraded("insufficient data");
        assert_eq!(t.direction, TrendDirection::Range);
        assert_eq!(t.score, Decimal::ZERO);
        assert!(t.error.is_some());
    }

    #[test]
    fn test_signal_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Signal::Hold).unwrap(), "\"HOLD\"");
    }

    #[test]
    fn test_zeroed_params() {
        let p = TradeParameters::zeroed();
        assert_eq!(p.leverage, 0);
        assert_eq!(p.margin, Decimal::ZERO);
        assert_eq!(p.entry_price, dec!(0));
    }
}
