//! Micro-timeframe (15M) entry-trigger scorer.
//!
//! In trend mode, evaluates classic trend-continuation triggers (ADX,
//! band-width, VWAP side, delta) to emit a directional signal. In range
//! mode, requires a validated boundary analysis and detects the
//! false-breakout-and-reclaim pattern: previous close outside the band,
//! latest close back inside, on the validated side. Also computes a
//! price-structure score (higher-high/higher-low or lower-low/lower-high
//! sequences) consumed by the fusion compensation step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::constants::ATR_PRICE_FALLBACK;
use crate::core::indicators;
use crate::core::range_boundary::RangeBoundary;
use crate::errors::ScoreError;
use crate::types::{
    Candle, ConfidenceTier, EntryMode, ExecutionAnalysis, MarketType, Signal, Timeframe,
    TrendDirection,
};

/// Trend-continuation trigger thresholds.
const TREND_ADX_MIN: Decimal = dec!(15);
const TREND_BAND_WIDTH_MIN: Decimal = dec!(0.02);
const TREND_DELTA_MIN: Decimal = dec!(0.1);

/// Range entries require the 15M bands to have narrowed below this.
const RANGE_BAND_WIDTH_MAX: Decimal = dec!(0.05);

/// Minimum relative move for a structure point (filters noise ticks).
const STRUCTURE_MIN_CHANGE: Decimal = dec!(0.001);

impl ConfidenceTier {
    /// ATR multiple placed beyond the band for a range-reclaim stop.
    fn reclaim_stop_atr(&self) -> Decimal {
        match self {
            Self::High => dec!(0.5),
            Self::Medium => dec!(0.8),
            Self::Low => dec!(1.0),
        }
    }

    /// Minimum reward:risk demanded of a range-reclaim target.
    fn reclaim_min_rr(&self) -> Decimal {
        match self {
            Self::High => dec!(6.0),
            Self::Medium => dec!(5.0),
            Self::Low => dec!(4.5),
        }
    }
}

/// Score the micro window and derive the entry trigger.
///
/// `boundary` must be supplied for range-market evaluation; without it the
/// range path holds.
pub fn analyze_execution(
    candles: &[Candle],
    macro_direction: TrendDirection,
    market_type: MarketType,
    boundary: Option<&RangeBoundary>,
) -> ExecutionAnalysis {
    let need = Timeframe::M15.min_candles();
    if candles.len() < need {
        return ExecutionAnalysis::degraded(
            ScoreError::InsufficientData {
                timeframe: Timeframe::M15,
                have: candles.len(),
                need,
            }
            .to_string(),
        );
    }

    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();

    let close = match closes.last() {
        Some(c) if *c > Decimal::ZERO => *c,
        _ => return ExecutionAnalysis::degraded("missing close price"),
    };

    let ema20 = indicators::ema(&closes, 20);
    let ema50 = indicators::ema(&closes, 50);
    let adx = indicators::adx(&highs, &lows, &closes, 14);
    let bands = indicators::bollinger(&closes, 20, dec!(2));
    let vwap = indicators::vwap(candles).unwrap_or(close);
    let delta = indicators::volume_delta(candles);

    let mut atr = indicators::atr(&highs, &lows, &closes, 14);
    if atr <= Decimal::ZERO {
        atr = close * ATR_PRICE_FALLBACK;
    }

    let confidence = trigger_confidence(adx.adx, bands.band_width);
    let tier = ConfidenceTier::from_confidence(confidence);
    let structure_score = structure_score(candles, macro_direction);
    let score = trigger_score(close, ema20, ema50, adx.adx, bands.band_width, vwap, delta, macro_direction);

    let (signal, entry_mode, entry_price, stop_loss, take_profit) = match market_type {
        MarketType::Range => {
            range_reclaim_signal(candles, boundary, bands.band_width, atr, tier)
        }
        MarketType::Trend => trend_signal(close, vwap, adx.adx, bands.band_width, delta),
    };

    debug!(
        signal = signal.as_str(),
        score = %score,
        structure = %structure_score,
        entry_mode = ?entry_mode,
        "micro execution scored"
    );

    ExecutionAnalysis {
        timeframe: Timeframe::M15,
        signal,
        score,
        structure_score,
        confidence,
        tier,
        entry_mode,
        entry_price,
        stop_loss,
        take_profit,
        atr,
        error: None,
    }
}

/// Trend-continuation trigger: directional strength, expanding bands,
/// price on the aggressive side of VWAP, delta pushing the same way.
fn trend_signal(
    close: Decimal,
    vwap: Decimal,
    adx: Decimal,
    band_width: Decimal,
    delta: Decimal,
) -> (Signal, Option<EntryMode>, Decimal, Decimal, Decimal) {
    let trending = adx > TREND_ADX_MIN;
    let volatile = band_width > TREND_BAND_WIDTH_MIN;

    if trending && volatile && close > vwap && delta > TREND_DELTA_MIN {
        return (
            Signal::Buy,
            Some(EntryMode::TrendContinuation),
            close,
            Decimal::ZERO,
            Decimal::ZERO,
        );
    }
    if trending && volatile && close < vwap && delta < -TREND_DELTA_MIN {
        return (
            Signal::Sell,
            Some(EntryMode::TrendContinuation),
            close,
            Decimal::ZERO,
            Decimal::ZERO,
        );
    }

    (Signal::Hold, None, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
}

/// False-breakout-and-reclaim detection against a validated boundary.
///
/// The stop sits just beyond the band (ATR-scaled by tier); the target
/// enforces the tier's minimum reward:risk.
fn range_reclaim_signal(
    candles: &[Candle],
    boundary: Option<&RangeBoundary>,
    band_width: Decimal,
    atr: Decimal,
    tier: ConfidenceTier,
) -> (Signal, Option<EntryMode>, Decimal, Decimal, Decimal) {
    let hold = (Signal::Hold, None, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);

    let Some(boundary) = boundary else {
        return hold;
    };
    // Entries only once the micro bands have actually compressed.
    if band_width >= RANGE_BAND_WIDTH_MAX {
        return hold;
    }
    if !boundary.lower_valid && !boundary.upper_valid {
        return hold;
    }
    if candles.len() < 2 {
        return hold;
    }

    let prev_close = candles[candles.len() - 2].close;
    let last_close = candles[candles.len() - 1].close;

    // Long reclaim: dipped below a validated lower band, closed back inside.
    if boundary.lower_valid && prev_close < boundary.lower && last_close > boundary.lower {
        let stop = boundary.lower - atr * tier.reclaim_stop_atr();
        let risk = last_close - stop;
        if risk <= Decimal::ZERO {
            return hold;
        }
        let target = last_close + tier.reclaim_min_rr() * risk;
        return (
            Signal::Buy,
            Some(EntryMode::RangeReclaim),
            last_close,
            stop,
            target,
        );
    }

    // Short reclaim: poked above a validated upper band, closed back inside.
    if boundary.upper_valid && prev_close > boundary.upper && last_close < boundary.upper {
        let stop = boundary.upper + atr * tier.reclaim_stop_atr();
        let risk = stop - last_close;
        if risk <= Decimal::ZERO {
            return hold;
        }
        let target = last_close - tier.reclaim_min_rr() * risk;
        return (
            Signal::Sell,
            Some(EntryMode::RangeReclaim),
            last_close,
            stop,
            target,
        );
    }

    hold
}

/// Bounded trigger score in [0, 5].
#[allow(clippy::too_many_arguments)]
fn trigger_score(
    close: Decimal,
    ema20: Decimal,
    ema50: Decimal,
    adx: Decimal,
    band_width: Decimal,
    vwap: Decimal,
    delta: Decimal,
    direction: TrendDirection,
) -> Decimal {
    let mut score = Decimal::ZERO;

    // EMA alignment with the prevailing direction.
    let ema_aligned = match direction {
        TrendDirection::Up => close > ema20 && ema20 > ema50,
        TrendDirection::Down => close < ema20 && ema20 < ema50,
        TrendDirection::Range => {
            ema20 > Decimal::ZERO && (close - ema20).abs() / ema20 < dec!(0.02)
        }
    };
    if ema_aligned {
        score += dec!(1);
    }

    if adx > dec!(20) {
        score += dec!(1);
    }

    // Compressed bands on the entry window keep the stop tight.
    if band_width > Decimal::ZERO && band_width < dec!(0.1) {
        score += dec!(1);
    }

    let vwap_side = match direction {
        TrendDirection::Up => close > vwap,
        TrendDirection::Down => close < vwap,
        TrendDirection::Range => vwap > Decimal::ZERO && (close - vwap).abs() / vwap < dec!(0.01),
    };
    if vwap_side {
        score += dec!(1);
    }

    let delta_ok = match direction {
        TrendDirection::Up => delta > TREND_DELTA_MIN,
        TrendDirection::Down => delta < -TREND_DELTA_MIN,
        TrendDirection::Range => delta.abs() > dec!(0.05),
    };
    if delta_ok {
        score += dec!(1);
    }

    score
}

/// Price-structure score in [0, 2]: one point each for a higher high and
/// higher low (uptrend) or lower low and lower high (downtrend) across two
/// 12-candle windows. A clear direction without clean structure earns a
/// half point.
fn structure_score(candles: &[Candle], direction: TrendDirection) -> Decimal {
    if candles.len() < 24 {
        return Decimal::ZERO;
    }

    let recent = &candles[candles.len() - 12..];
    let prior = &candles[candles.len() - 24..candles.len() - 12];

    let window_high = |w: &[Candle]| w.iter().map(|c| c.high).fold(Decimal::MIN, Decimal::max);
    let window_low = |w: &[Candle]| w.iter().map(|c| c.low).fold(Decimal::MAX, Decimal::min);

    let recent_high = window_high(recent);
    let recent_low = window_low(recent);
    let prior_high = window_high(prior);
    let prior_low = window_low(prior);

    if prior_high <= Decimal::ZERO || prior_low <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let high_change = (recent_high - prior_high).abs() / prior_high;
    let low_change = (recent_low - prior_low).abs() / prior_low;

    let mut score = Decimal::ZERO;
    match direction {
        TrendDirection::Up => {
            if recent_high > prior_high && high_change >= STRUCTURE_MIN_CHANGE {
                score += dec!(1);
            }
            if recent_low > prior_low && low_change >= STRUCTURE_MIN_CHANGE {
                score += dec!(1);
            }
        }
        TrendDirection::Down => {
            if recent_low < prior_low && low_change >= STRUCTURE_MIN_CHANGE {
                score += dec!(1);
            }
            if recent_high < prior_high && high_change >= STRUCTURE_MIN_CHANGE {
                score += dec!(1);
            }
        }
        TrendDirection::Range => {}
    }

    // Clear trend but unreadable structure still beats a flat zero.
    if score == Decimal::ZERO && direction != TrendDirection::Range {
        score = dec!(0.5);
    }

    score
}

/// Trigger confidence in [0, 1] from directional strength and band width.
fn trigger_confidence(adx: Decimal, band_width: Decimal) -> Decimal {
    let mut confidence = dec!(0.5);

    if adx > dec!(25) {
        confidence += dec!(0.3);
    } else if adx > dec!(20) {
        confidence += dec!(0.2);
    } else if adx < dec!(15) {
        confidence -= dec!(0.2);
    }

    if band_width < dec!(0.05) {
        confidence += dec!(0.2);
    } else if band_width > dec!(0.15) {
        confidence -= dec!(0.1);
    }

    confidence.clamp(Decimal::ZERO, dec!(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(i: i64, close: Decimal, volume: Decimal) -> Candle {
        Candle {
            open_time: i * 900_000,
            open: close - dec!(0.1),
            high: close + dec!(0.3),
            low: close - dec!(0.3),
            close,
            volume,
        }
    }

    fn rising_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| candle(i as i64, dec!(100) + Decimal::from(i as u64), dec!(1000)))
            .collect()
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let wiggle = Decimal::from(i as u64 % 2) * dec!(0.2) - dec!(0.1);
                candle(i as i64, dec!(100) + wiggle, dec!(1000))
            })
            .collect()
    }

    fn valid_lower_boundary() -> RangeBoundary {
        RangeBoundary {
            upper_valid: false,
            lower_valid: true,
            upper: dec!(101.5),
            middle: dec!(100.2),
            lower: dec!(99),
            band_width: dec!(0.025),
            factor_score: dec!(4),
            upper_touches: 0,
            lower_touches: 3,
        }
    }

    #[test]
    fn test_insufficient_data_degrades() {
        let result = analyze_execution(
            &rising_candles(10),
            TrendDirection::Up,
            MarketType::Trend,
            None,
        );
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.score, Decimal::ZERO);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_trend_continuation_buy() {
        let result = analyze_execution(
            &rising_candles(50),
            TrendDirection::Up,
            MarketType::Trend,
            None,
        );
        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.entry_mode, Some(EntryMode::TrendContinuation));
        assert_eq!(result.structure_score, dec!(2));
        assert!(result.score >= dec!(3));
        assert!(result.atr > Decimal::ZERO);
    }

    #[test]
    fn test_trend_mode_holds_without_delta() {
        // Flat series: no directional strength, no delta push.
        let result = analyze_execution(
            &flat_candles(50),
            TrendDirection::Up,
            MarketType::Trend,
            None,
        );
        assert_eq!(result.signal, Signal::Hold);
        assert!(result.entry_mode.is_none());
    }

    #[test]
    fn test_range_reclaim_long() {
        // Tight flat series, then a dip below the validated lower band and a
        // close back inside.
        let mut candles = flat_candles(48);
        candles.push(candle(48, dec!(98.8), dec!(1000)));
        candles.push(candle(49, dec!(99.3), dec!(1000)));

        let boundary = valid_lower_boundary();
        let result = analyze_execution(
            &candles,
            TrendDirection::Range,
            MarketType::Range,
            Some(&boundary),
        );

        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.entry_mode, Some(EntryMode::RangeReclaim));
        assert_eq!(result.entry_price, dec!(99.3));
        assert!(result.stop_loss < boundary.lower, "stop goes beyond the band");
        // Target honours the tier's minimum reward:risk.
        let risk = result.entry_price - result.stop_loss;
        let reward = result.take_profit - result.entry_price;
        assert!(reward >= dec!(4.5) * risk);
    }

    #[test]
    fn test_range_holds_without_boundary() {
        let candles = flat_candles(50);
        let result =
            analyze_execution(&candles, TrendDirection::Range, MarketType::Range, None);
        assert_eq!(result.signal, Signal::Hold);
    }

    #[test]
    fn test_range_holds_when_bands_wide() {
        // Volatile series: band width above the narrowing gate.
        let mut candles = rising_candles(48);
        candles.push(candle(48, dec!(95), dec!(1000)));
        candles.push(candle(49, dec!(99.3), dec!(1000)));
        let boundary = valid_lower_boundary();
        let result = analyze_execution(
            &candles,
            TrendDirection::Range,
            MarketType::Range,
            Some(&boundary),
        );
        assert_eq!(result.signal, Signal::Hold);
    }

    #[test]
    fn test_range_holds_on_invalid_side() {
        // Reclaim pattern on the lower band, but only the upper is valid.
        let mut candles = flat_candles(48);
        candles.push(candle(48, dec!(98.8), dec!(1000)));
        candles.push(candle(49, dec!(99.3), dec!(1000)));
        let boundary = RangeBoundary {
            lower_valid: false,
            upper_valid: true,
            ..valid_lower_boundary()
        };
        let result = analyze_execution(
            &candles,
            TrendDirection::Range,
            MarketType::Range,
            Some(&boundary),
        );
        assert_eq!(result.signal, Signal::Hold);
    }

    #[test]
    fn test_structure_score_downtrend() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| candle(i as i64, dec!(200) - Decimal::from(i as u64), dec!(1000)))
            .collect();
        let result = analyze_execution(
            &candles,
            TrendDirection::Down,
            MarketType::Trend,
            None,
        );
        assert_eq!(result.structure_score, dec!(2));
        assert_eq!(result.signal, Signal::Sell);
    }

    #[test]
    fn test_structure_score_range_direction_zero() {
        let result = analyze_execution(
            &flat_candles(50),
            TrendDirection::Range,
            MarketType::Trend,
            None,
        );
        assert_eq!(result.structure_score, Decimal::ZERO);
    }
}
