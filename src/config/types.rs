use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_LOSS_USD;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

/// Engine configuration, loaded from `engine.json` with env overrides.
///
/// Every section defaults sensibly so tests and library embedders can
/// construct it directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub evaluation: EvaluationConfig,
    pub risk: RiskConfig,
    pub fusion: FusionConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Evaluation loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Symbols evaluated by the engine loop.
    pub symbols: Vec<String>,
    /// Seconds between evaluation rounds.
    pub interval_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".into(), "ETHUSDT".into()],
            interval_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Maximum acceptable loss per trade in USD. Margin sizing guarantees a
    /// stop-out never loses more than this.
    #[serde(with = "rust_decimal::serde::str")]
    pub max_loss_usd: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_loss_usd: DEFAULT_MAX_LOSS_USD,
        }
    }
}

// ---------------------------------------------------------------------------
// Fusion
// ---------------------------------------------------------------------------

/// One value per acceptance tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierValues {
    #[serde(with = "rust_decimal::serde::str")]
    pub strong: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub moderate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub weak: Decimal,
}

/// Fusion thresholds. The tier structure and adjustable-threshold mechanism
/// are fixed; these magnitudes are tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Normalized-score lower bounds for the three tiers. Each tier is a
    /// half-open window: moderate covers `[moderate, strong)`, weak covers
    /// `[weak, moderate)`.
    pub score_bands: TierValues,
    /// Per-tier macro-score bars.
    pub trend_bars: TierValues,
    /// Per-tier micro-score bars.
    pub entry_bars: TierValues,
    /// Per-tier base mid-score thresholds before adjustment.
    pub factor_base: TierValues,
    /// Lowest a mid-score threshold can be adjusted down to.
    #[serde(with = "rust_decimal::serde::str")]
    pub threshold_floor: Decimal,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            score_bands: TierValues {
                strong: dec!(30),
                moderate: dec!(25),
                weak: dec!(20),
            },
            trend_bars: TierValues {
                strong: dec!(8),
                moderate: dec!(6),
                weak: dec!(4),
            },
            entry_bars: TierValues {
                strong: dec!(3),
                moderate: dec!(2),
                weak: dec!(1),
            },
            factor_base: TierValues {
                strong: dec!(2),
                moderate: dec!(1.5),
                weak: dec!(1),
            },
            threshold_floor: dec!(0.5),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
        }
    }
}
