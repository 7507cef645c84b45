//! Fusion decision engine.
//!
//! Blends the three timeframe scores into one directional signal through
//! dynamic inter-timeframe weights, a compensation bonus for exceptionally
//! strong single dimensions, and adaptive per-tier mid-score thresholds.
//!
//! The tiered, compensated design avoids two opposite failure modes: a
//! strict AND of three scores that almost never fires, and a purely
//! additive blend that fires too often by averaging away a weak dimension.
//! A dominant timeframe can carry a trade, but each tier still demands
//! baseline confirmation from the other two.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::config::FusionConfig;
use crate::types::{
    BlendWeights, ConfidenceTier, EntryMode, ExecutionAnalysis, FactorAnalysis, FusionDecision,
    Signal, TierThresholds, TrendAnalysis, TrendDirection,
};

/// Base inter-timeframe weights.
const BASE_WEIGHTS: BlendWeights = BlendWeights {
    trend: dec!(0.55),
    factor: dec!(0.30),
    entry: dec!(0.15),
};

/// Macro-dominant tilt when the trend window is very strong.
const TREND_TILT: BlendWeights = BlendWeights {
    trend: dec!(0.70),
    factor: dec!(0.25),
    entry: dec!(0.05),
};

/// Balanced tilt when all three windows clear their secondary thresholds.
const BALANCED_TILT: BlendWeights = BlendWeights {
    trend: dec!(0.45),
    factor: dec!(0.35),
    entry: dec!(0.20),
};

/// Mid-dominant tilt when factor confirmation is unusually strong.
const FACTOR_TILT: BlendWeights = BlendWeights {
    trend: dec!(0.50),
    factor: dec!(0.35),
    entry: dec!(0.15),
};

/// Compensation is capped so one hot dimension cannot dominate the gate.
const MAX_COMPENSATION: Decimal = dec!(2);

/// Fuse the three timeframe scores into a directional decision.
pub fn fuse(
    trend: &TrendAnalysis,
    factors: &FactorAnalysis,
    execution: &ExecutionAnalysis,
    config: &FusionConfig,
) -> FusionDecision {
    let trend_score = trend.score;
    let factor_score = factors.score;
    let entry_score = execution.score;
    let structure_score = execution.structure_score;

    let weights = dynamic_weights(trend_score, factor_score, entry_score);

    let blended = trend_score / dec!(10) * weights.trend
        + factor_score / dec!(6) * weights.factor
        + entry_score / dec!(5) * weights.entry;
    let normalized_score = (blended * dec!(100)).round().to_i64().unwrap_or(0);

    let compensation = compensation(
        Decimal::from(normalized_score),
        trend_score,
        entry_score,
        structure_score,
    );

    let thresholds = adjusted_thresholds(
        Decimal::from(normalized_score),
        trend_score,
        compensation,
        config,
    );

    debug!(
        normalized_score,
        compensation = %compensation,
        trend = %trend_score,
        factor = %factor_score,
        entry = %entry_score,
        structure = %structure_score,
        "fusion inputs blended"
    );

    // Range markets bypass the tiered logic entirely: only a validated
    // boundary-reclaim trigger from the micro window is tradable.
    if trend.direction == TrendDirection::Range {
        let signal = if execution.signal.is_actionable()
            && execution.entry_mode == Some(EntryMode::RangeReclaim)
        {
            execution.signal
        } else {
            Signal::Hold
        };
        let tier = signal.is_actionable().then_some(execution.tier);
        return FusionDecision {
            signal,
            normalized_score,
            compensation,
            thresholds,
            weights,
            tier,
        };
    }

    let normalized = Decimal::from(normalized_score);
    let directional = match trend.direction {
        TrendDirection::Up => Signal::Buy,
        TrendDirection::Down => Signal::Sell,
        TrendDirection::Range => unreachable!("range handled above"),
    };

    // Descending tiers on half-open normalized-score windows; first match
    // wins.
    let tier = if normalized >= config.score_bands.strong
        && trend_score >= config.trend_bars.strong
        && factor_score >= thresholds.strong
        && entry_score >= config.entry_bars.strong
    {
        Some(ConfidenceTier::High)
    } else if normalized >= config.score_bands.moderate
        && normalized < config.score_bands.strong
        && trend_score >= config.trend_bars.moderate
        && factor_score >= thresholds.moderate
        && entry_score >= config.entry_bars.moderate
    {
        Some(ConfidenceTier::Medium)
    } else if normalized >= config.score_bands.weak
        && normalized < config.score_bands.moderate
        && trend_score >= config.trend_bars.weak
        && factor_score >= thresholds.weak
        && entry_score >= config.entry_bars.weak
    {
        Some(ConfidenceTier::Low)
    } else {
        None
    };

    let signal = if tier.is_some() {
        directional
    } else {
        Signal::Hold
    };

    FusionDecision {
        signal,
        normalized_score,
        compensation,
        thresholds,
        weights,
        tier,
    }
}

/// Re-weight the blend toward whichever window is dominant this cycle.
fn dynamic_weights(
    trend_score: Decimal,
    factor_score: Decimal,
    entry_score: Decimal,
) -> BlendWeights {
    if trend_score >= dec!(8) {
        TREND_TILT
    } else if trend_score >= dec!(7) && factor_score >= dec!(4) && entry_score >= dec!(3) {
        BALANCED_TILT
    } else if factor_score >= dec!(5) {
        FACTOR_TILT
    } else {
        BASE_WEIGHTS
    }
}

/// Additive bonus rewarding exceptionally strong single dimensions, capped
/// at [`MAX_COMPENSATION`].
fn compensation(
    normalized: Decimal,
    trend_score: Decimal,
    entry_score: Decimal,
    structure_score: Decimal,
) -> Decimal {
    let mut bonus = Decimal::ZERO;

    if normalized >= dec!(80) {
        bonus += dec!(1);
    } else if normalized >= dec!(75) {
        bonus += dec!(0.5);
    }

    if trend_score >= dec!(9) {
        bonus += dec!(1.5);
    } else if trend_score >= dec!(8) {
        bonus += dec!(1);
    } else if trend_score >= dec!(7) {
        bonus += dec!(0.5);
    }

    if entry_score >= dec!(5) {
        bonus += dec!(1);
    } else if entry_score >= dec!(4) {
        bonus += dec!(0.5);
    }

    if structure_score >= dec!(3) {
        bonus += dec!(1);
    } else if structure_score >= dec!(2) {
        bonus += dec!(0.5);
    }

    bonus.min(MAX_COMPENSATION)
}

/// Context-sensitive mid-score thresholds: the bar drops as the blended and
/// macro scores rise and as compensation accrues, floored at a small
/// positive minimum.
fn adjusted_thresholds(
    normalized: Decimal,
    trend_score: Decimal,
    compensation: Decimal,
    config: &FusionConfig,
) -> TierThresholds {
    let mut strong = config.factor_base.strong;
    let mut moderate = config.factor_base.moderate;
    let mut weak = config.factor_base.weak;

    if normalized >= dec!(80) {
        strong -= dec!(1);
        moderate -= dec!(0.75);
        weak -= dec!(0.5);
    } else if normalized >= dec!(75) {
        strong -= dec!(0.5);
        moderate -= dec!(0.25);
    }

    if trend_score >= dec!(8) {
        strong -= dec!(0.5);
        moderate -= dec!(0.25);
    }

    strong -= compensation;
    moderate -= compensation;
    weak -= compensation;

    let floor = config.threshold_floor;
    TierThresholds {
        strong: strong.max(floor),
        moderate: moderate.max(floor),
        weak: weak.max(floor),
    }
}
