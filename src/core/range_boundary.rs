//! Range-market boundary validation on the mid (1H) window.
//!
//! A boundary is tradable only when price has actually respected it:
//! touched at least twice in the recent window, with a 5-factor
//! confirmation that the market is genuinely quiet (volume below a multiple
//! of its average, bounded delta, bounded OI drift, no fresh 20-bar
//! high/low, price near VWAP).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::indicators;
use crate::errors::ScoreError;
use crate::types::{AuxiliaryData, Candle, Timeframe};

/// Closes within this fraction of a band count as touches.
const TOUCH_TOLERANCE: Decimal = dec!(0.015);
/// Number of trailing closes inspected for touches.
const TOUCH_WINDOW: usize = 6;
/// Current volume must stay below this multiple of the 20-bar average.
const VOLUME_CEILING: Decimal = dec!(1.7);
/// Delta magnitude ceiling for a quiet range.
const DELTA_CEILING: Decimal = dec!(0.02);
/// OI drift ceiling over the 6-period lookback.
const OI_CEILING: Decimal = dec!(0.02);
/// Price must sit within this fraction of VWAP.
const VWAP_BAND: Decimal = dec!(0.02);
/// Factor passes required for a boundary to be tradable.
const MIN_FACTOR_SCORE: Decimal = dec!(3);

/// Validated range-boundary analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeBoundary {
    pub upper_valid: bool,
    pub lower_valid: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub upper: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub middle: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub lower: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub band_width: Decimal,
    /// Confirmation passes in [0, 5].
    #[serde(with = "rust_decimal::serde::str")]
    pub factor_score: Decimal,
    pub upper_touches: u32,
    pub lower_touches: u32,
}

/// Validate the 1H range boundaries.
///
/// Returns an error only for insufficient input; the caller degrades it to
/// "no valid boundary" rather than failing the evaluation.
pub fn analyze_range_boundary(
    candles: &[Candle],
    aux: &AuxiliaryData,
) -> Result<RangeBoundary, ScoreError> {
    let need = Timeframe::H1.min_candles();
    if candles.len() < need {
        return Err(ScoreError::InsufficientData {
            timeframe: Timeframe::H1,
            have: candles.len(),
            need,
        });
    }

    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

    let bands = indicators::bollinger(&closes, 20, dec!(2));
    if bands.middle <= Decimal::ZERO {
        return Err(ScoreError::computation("degenerate band middle"));
    }

    // Touch counting over the trailing window.
    let recent_closes = &closes[closes.len() - TOUCH_WINDOW..];
    let lower_touches = recent_closes
        .iter()
        .filter(|c| **c <= bands.lower * (dec!(1) + TOUCH_TOLERANCE))
        .count() as u32;
    let upper_touches = recent_closes
        .iter()
        .filter(|c| **c >= bands.upper * (dec!(1) - TOUCH_TOLERANCE))
        .count() as u32;

    let mut factor_score = Decimal::ZERO;

    // Volume contraction: ranges live on thin volume.
    let avg_volume = indicators::sma(&volumes, 20).unwrap_or(Decimal::ZERO);
    let current_volume = *volumes.last().unwrap_or(&Decimal::ZERO);
    if avg_volume > Decimal::ZERO && current_volume <= avg_volume * VOLUME_CEILING {
        factor_score += dec!(1);
    }

    // Bounded delta.
    let delta = indicators::volume_delta(candles);
    if delta.abs() <= DELTA_CEILING {
        factor_score += dec!(1);
    }

    // Bounded OI drift.
    let oi_change = indicators::oi_change(&aux.open_interest, 6);
    if oi_change.abs() <= OI_CEILING {
        factor_score += dec!(1);
    }

    // No fresh extreme: the latest bar must not print the 20-bar high/low.
    let recent_highs = &highs[highs.len() - 20..];
    let recent_lows = &lows[lows.len() - 20..];
    let max_high = recent_highs.iter().copied().fold(Decimal::MIN, Decimal::max);
    let min_low = recent_lows.iter().copied().fold(Decimal::MAX, Decimal::min);
    let last_high = *recent_highs.last().expect("20-bar window");
    let last_low = *recent_lows.last().expect("20-bar window");
    if last_high < max_high && last_low > min_low {
        factor_score += dec!(1);
    }

    // Price near VWAP.
    if let Some(vwap) = indicators::vwap(candles) {
        if vwap > Decimal::ZERO {
            let deviation = (closes[closes.len() - 1] - vwap).abs() / vwap;
            if deviation < VWAP_BAND {
                factor_score += dec!(1);
            }
        }
    }

    let lower_valid = lower_touches >= 2 && factor_score >= MIN_FACTOR_SCORE;
    let upper_valid = upper_touches >= 2 && factor_score >= MIN_FACTOR_SCORE;

    debug!(
        lower_touches,
        upper_touches,
        factor_score = %factor_score,
        lower_valid,
        upper_valid,
        "range boundary analyzed"
    );

    Ok(RangeBoundary {
        upper_valid,
        lower_valid,
        upper: bands.upper,
        middle: bands.middle,
        lower: bands.lower,
        band_width: bands.band_width,
        factor_score,
        upper_touches,
        lower_touches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(i: i64, close: Decimal, volume: Decimal) -> Candle {
        Candle {
            open_time: i * 3_600_000,
            open: close,
            high: close + dec!(0.3),
            low: close - dec!(0.3),
            close,
            volume,
        }
    }

    /// Oscillating series that repeatedly tags both bands without breaking
    /// out, on flat volume.
    fn oscillating_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let phase = i % 4;
                let close = match phase {
                    0 => dec!(98),
                    1 => dec!(100),
                    2 => dec!(102),
                    _ => dec!(100),
                };
                candle(i as i64, close, dec!(1000))
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_errors() {
        let candles = oscillating_candles(30);
        let err = analyze_range_boundary(&candles, &AuxiliaryData::default()).unwrap_err();
        assert!(matches!(err, ScoreError::InsufficientData { .. }));
    }

    #[test]
    fn test_quiet_range_scores_factors() {
        let candles = oscillating_candles(52);
        let boundary = analyze_range_boundary(&candles, &AuxiliaryData::default()).unwrap();
        // Flat volume, no fresh extremes, near VWAP, no OI data (0 drift).
        assert!(boundary.factor_score >= dec!(3));
        assert!(boundary.upper > boundary.lower);
    }

    #[test]
    fn test_touch_counting() {
        // Quiet oscillation, then the last two closes pinned near the lower
        // band.
        let mut candles = oscillating_candles(50);
        candles.push(candle(50, dec!(96.5), dec!(1000)));
        candles.push(candle(51, dec!(96.5), dec!(1000)));
        let boundary = analyze_range_boundary(&candles, &AuxiliaryData::default()).unwrap();
        assert!(boundary.lower_touches >= 2, "got {}", boundary.lower_touches);
        assert!(boundary.upper_touches < 2);
        assert!(boundary.lower_valid);
    }

    #[test]
    fn test_breakout_volume_invalidates() {
        // A volume spike on the last bar blows the volume factor; delta
        // swings with it.
        let mut candles = oscillating_candles(51);
        candles.push(candle(51, dec!(104), dec!(20000)));
        let boundary = analyze_range_boundary(&candles, &AuxiliaryData::default()).unwrap();
        // Fresh 20-bar high and a volume spike: at most 3 factors remain.
        assert!(boundary.factor_score <= dec!(3));
    }
}
