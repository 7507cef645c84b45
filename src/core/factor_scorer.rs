//! Mid-timeframe (1H) factor confirmation scorer.
//!
//! Evaluates six binary factors against the macro direction. Price-vs-VWAP
//! side agreement is a hard gate in trend mode: when it fails, the whole
//! score is forced to zero regardless of the other factors. In a range
//! macro-direction the gate and the factor thresholds relax to small
//! deviation bands, since there is no directional bias to confirm against.
//!
//! Alongside the raw 0-6 pass count (what the fusion engine consumes), the
//! scorer emits a category-weighted score re-weighted by the adaptive
//! learner for downstream use.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::core::adaptive_weights::WeightLearner;
use crate::core::category::{self, Category, Factor};
use crate::core::indicators;
use crate::errors::ScoreError;
use crate::types::{
    AuxiliaryData, Candle, FactorAnalysis, FactorFlags, Timeframe, TrendDirection,
};

/// Factor thresholds (trend mode).
const DELTA_IMBALANCE: Decimal = dec!(0.1);
const OI_LONG_MIN: Decimal = dec!(0.02);
const OI_SHORT_MAX: Decimal = dec!(-0.03);
const FUNDING_NEUTRAL_BAND: Decimal = dec!(0.0005);

/// Relaxed deviation bands (range mode).
const RANGE_VWAP_BAND: Decimal = dec!(0.01);
const RANGE_EMA_BAND: Decimal = dec!(0.02);
const RANGE_OI_MIN: Decimal = dec!(0.01);
const RANGE_DELTA_MIN: Decimal = dec!(0.05);

/// Score the mid window against the macro direction.
pub fn analyze_factors(
    symbol: &str,
    candles: &[Candle],
    aux: &AuxiliaryData,
    macro_direction: TrendDirection,
    learner: &WeightLearner,
) -> FactorAnalysis {
    let need = Timeframe::H1.min_candles();
    if candles.len() < need {
        return FactorAnalysis::degraded(
            ScoreError::InsufficientData {
                timeframe: Timeframe::H1,
                have: candles.len(),
                need,
            }
            .to_string(),
        );
    }

    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let close = match closes.last() {
        Some(c) if *c > Decimal::ZERO => *c,
        _ => return FactorAnalysis::degraded("missing close price"),
    };

    let ema20 = indicators::ema(&closes, 20);
    let ema50 = indicators::ema(&closes, 50);
    let vwap = match indicators::vwap(&candles[candles.len() - 20..]) {
        Some(v) if v > Decimal::ZERO => v,
        _ => return FactorAnalysis::degraded("VWAP unavailable (zero volume window)"),
    };
    let delta = indicators::volume_delta(candles);
    let oi_change = indicators::oi_change(&aux.open_interest, 6);
    let funding_rate = aux.funding_rate.unwrap_or(Decimal::ZERO);

    // 1. VWAP side agreement, a hard gate in trend mode.
    let vwap_aligned = match macro_direction {
        TrendDirection::Up => close > vwap,
        TrendDirection::Down => close < vwap,
        TrendDirection::Range => (close - vwap).abs() / vwap < RANGE_VWAP_BAND,
    };

    if !vwap_aligned && macro_direction != TrendDirection::Range {
        debug!(
            symbol,
            close = %close,
            vwap = %vwap,
            direction = ?macro_direction,
            "VWAP gate failed, factor score forced to 0"
        );
        return FactorAnalysis {
            timeframe: Timeframe::H1,
            score: Decimal::ZERO,
            weighted_score: Decimal::ZERO,
            vwap_aligned: false,
            factors: FactorFlags::default(),
            vwap,
            delta,
            oi_change,
            funding_rate,
            error: None,
        };
    }

    // 2. EMA breakout agreement.
    let breakout = match macro_direction {
        TrendDirection::Up => close > ema20 && ema20 > ema50,
        TrendDirection::Down => close < ema20 && ema20 < ema50,
        TrendDirection::Range => {
            ema20 > Decimal::ZERO && (close - ema20).abs() / ema20 < RANGE_EMA_BAND
        }
    };

    // 3. Volume confirmation via delta magnitude.
    let volume = delta.abs() > DELTA_IMBALANCE;

    // 4. OI change in the direction of the trend.
    let oi = match macro_direction {
        TrendDirection::Up => oi_change >= OI_LONG_MIN,
        TrendDirection::Down => oi_change <= OI_SHORT_MAX,
        TrendDirection::Range => oi_change.abs() >= RANGE_OI_MIN,
    };

    // 5. Funding-rate neutrality: a crowded market fades the edge.
    let funding = funding_rate.abs() <= FUNDING_NEUTRAL_BAND;

    // 6. Delta imbalance agreeing with the direction.
    let delta_aligned = match macro_direction {
        TrendDirection::Up => delta > DELTA_IMBALANCE,
        TrendDirection::Down => delta < -DELTA_IMBALANCE,
        TrendDirection::Range => delta.abs() > RANGE_DELTA_MIN,
    };

    let flags = FactorFlags {
        vwap: vwap_aligned,
        breakout,
        volume,
        oi_change: oi,
        funding,
        delta: delta_aligned,
    };

    let raw_score = [vwap_aligned, breakout, volume, oi, funding, delta_aligned]
        .iter()
        .filter(|passed| **passed)
        .count();

    // Category-weighted score, re-weighted by learned factor win rates.
    let market_type = macro_direction.market_type();
    let base = category::weights(Category::classify(symbol), market_type, Timeframe::H1);
    let adjusted = learner.adjusted_weights(symbol, base);
    let outcomes = [
        (Factor::Vwap, vwap_aligned),
        (Factor::Breakout, breakout),
        (Factor::Volume, volume),
        (Factor::OiChange, oi),
        (Factor::Funding, funding),
        (Factor::Delta, delta_aligned),
    ];
    let weighted_score = category::weighted_score(&adjusted, &outcomes);

    debug!(
        symbol,
        raw_score,
        weighted = %weighted_score.round_dp(3),
        direction = ?macro_direction,
        "mid factors scored"
    );

    FactorAnalysis {
        timeframe: Timeframe::H1,
        score: Decimal::from(raw_score as u64),
        weighted_score,
        vwap_aligned,
        factors: flags,
        vwap,
        delta,
        oi_change,
        funding_rate,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OpenInterestPoint;

    fn candle(i: i64, close: Decimal, volume: Decimal) -> Candle {
        Candle {
            open_time: i * 3_600_000,
            open: close - dec!(0.2),
            high: close + dec!(0.5),
            low: close - dec!(0.5),
            close,
            volume,
        }
    }

    /// Steady uptrend: close > VWAP, EMAs stacked, every bar a buy bar.
    fn uptrend_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| candle(i as i64, dec!(100) + Decimal::from(i as u64), dec!(1000)))
            .collect()
    }

    fn oi_series(start: Decimal, step: Decimal, n: usize) -> Vec<OpenInterestPoint> {
        (0..n)
            .map(|i| OpenInterestPoint {
                timestamp: i as i64,
                sum_open_interest: start + step * Decimal::from(i as u64),
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_degrades() {
        let candles = uptrend_candles(20);
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &AuxiliaryData::default(),
            TrendDirection::Up,
            &WeightLearner::in_memory(),
        );
        assert_eq!(result.score, Decimal::ZERO);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_uptrend_scores_directional_factors() {
        let candles = uptrend_candles(60);
        let aux = AuxiliaryData {
            funding_rate: Some(dec!(0.0001)),
            open_interest: oi_series(dec!(1000), dec!(10), 7),
            ticker: None,
        };
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &aux,
            TrendDirection::Up,
            &WeightLearner::in_memory(),
        );
        assert!(result.vwap_aligned);
        assert!(result.factors.breakout);
        assert!(result.factors.delta);
        assert!(result.factors.funding);
        assert!(result.factors.oi_change, "6-period OI growth ~6% should pass");
        assert!(result.score >= dec!(5));
        assert!(result.weighted_score > Decimal::ZERO);
        assert!(result.weighted_score <= dec!(1));
    }

    #[test]
    fn test_vwap_gate_forces_zero_in_trend_mode() {
        // Rising prices but macro says Down: close sits above VWAP, gate fails.
        let candles = uptrend_candles(60);
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &AuxiliaryData::default(),
            TrendDirection::Down,
            &WeightLearner::in_memory(),
        );
        assert!(!result.vwap_aligned);
        assert_eq!(result.score, Decimal::ZERO);
        assert_eq!(result.weighted_score, Decimal::ZERO);
        assert!(result.error.is_none(), "gate failure is a valid result, not an error");
    }

    #[test]
    fn test_range_mode_relaxes_gate() {
        // Flat series: close hugs VWAP, which passes the range-mode band.
        let candles: Vec<Candle> = (0..60)
            .map(|i| candle(i, dec!(100) + Decimal::from(i % 2) * dec!(0.1), dec!(1000)))
            .collect();
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &AuxiliaryData::default(),
            TrendDirection::Range,
            &WeightLearner::in_memory(),
        );
        assert!(result.vwap_aligned);
        assert!(result.factors.breakout, "flat price within EMA band passes in range mode");
    }

    #[test]
    fn test_opposing_oi_fails_factor() {
        let candles = uptrend_candles(60);
        let aux = AuxiliaryData {
            funding_rate: None,
            open_interest: oi_series(dec!(1000), dec!(-10), 7),
            ticker: None,
        };
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &aux,
            TrendDirection::Up,
            &WeightLearner::in_memory(),
        );
        assert!(!result.factors.oi_change);
    }

    #[test]
    fn test_missing_aux_lowers_score_not_crash() {
        let candles = uptrend_candles(60);
        let result = analyze_factors(
            "BTCUSDT",
            &candles,
            &AuxiliaryData::default(),
            TrendDirection::Up,
            &WeightLearner::in_memory(),
        );
        // No OI history: factor fails silently; funding 0 counts as neutral.
        assert!(!result.factors.oi_change);
        assert!(result.factors.funding);
        assert!(result.error.is_none());
    }
}
