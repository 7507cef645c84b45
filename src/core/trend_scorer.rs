//! Macro-timeframe (4H) trend scorer.
//!
//! Reads trend direction from the full price/MA ordering gated by
//! directional strength, and scores the window on six bounded sub-factors
//! summing to 10: trend ordering (0-2), ADX strength (0-2), MACD momentum
//! (0-3), band-width expansion (0-1), volume-delta confirmation (0-1) and
//! funding-rate anomaly (0-1).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::core::indicators::{self, AdxReading};
use crate::errors::ScoreError;
use crate::types::{
    AuxiliaryData, Candle, Timeframe, TrendAnalysis, TrendDirection, TrendSnapshot,
};

/// ADX above this reads as a strong trend; full MA ordering alone is a
/// weaker directional read.
const ADX_STRONG: Decimal = dec!(30);
const ADX_MODERATE: Decimal = dec!(20);

/// Score the macro window.
///
/// With fewer than 200 candles, or on an internal computation failure,
/// returns the degraded neutral result (score 0, `Range`) instead of
/// propagating an error.
pub fn analyze_trend(candles: &[Candle], aux: &AuxiliaryData) -> TrendAnalysis {
    let need = Timeframe::H4.min_candles();
    if candles.len() < need {
        return TrendAnalysis::degraded(
            ScoreError::InsufficientData {
                timeframe: Timeframe::H4,
                have: candles.len(),
                need,
            }
            .to_string(),
        );
    }

    match compute(candles, aux) {
        Ok(analysis) => analysis,
        Err(e) => TrendAnalysis::degraded(e.to_string()),
    }
}

fn compute(candles: &[Candle], aux: &AuxiliaryData) -> Result<TrendAnalysis, ScoreError> {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();

    let close = *closes
        .last()
        .ok_or_else(|| ScoreError::computation("empty close series"))?;

    let ma20 = indicators::sma(&closes, 20)
        .ok_or_else(|| ScoreError::computation("MA20 window"))?;
    let ma50 = indicators::sma(&closes, 50)
        .ok_or_else(|| ScoreError::computation("MA50 window"))?;
    let ma200 = indicators::sma(&closes, 200)
        .ok_or_else(|| ScoreError::computation("MA200 window"))?;

    let adx = indicators::adx(&highs, &lows, &closes, 14);
    let bands = indicators::bollinger(&closes, 20, dec!(2));
    let vwap = indicators::vwap(candles).unwrap_or(close);
    let macd = indicators::macd(&closes, 12, 26, 9);
    let atr = indicators::atr(&highs, &lows, &closes, 14);
    let delta = indicators::volume_delta(candles);
    let funding_rate = aux.funding_rate.unwrap_or(Decimal::ZERO);

    let direction = direction(close, ma20, ma50, ma200, &adx);
    let score = score(close, ma20, ma50, ma200, &adx, bands.band_width, &macd, delta, funding_rate);
    let confidence = confidence(adx.adx, bands.band_width);

    debug!(
        direction = ?direction,
        score = %score,
        adx = %adx.adx.round_dp(1),
        band_width = %bands.band_width.round_dp(4),
        "macro trend scored"
    );

    Ok(TrendAnalysis {
        timeframe: Timeframe::H4,
        direction,
        market_type: direction.market_type(),
        score,
        confidence,
        snapshot: TrendSnapshot {
            close,
            ma20,
            ma50,
            ma200,
            adx: adx.adx,
            di_plus: adx.di_plus,
            di_minus: adx.di_minus,
            band_width: bands.band_width,
            vwap,
            macd_histogram: macd.histogram,
            atr,
        },
        error: None,
    })
}

/// Directional read from MA ordering and directional strength.
///
/// A strong trend requires the full ordering plus ADX confirmation; the
/// short ordering alone yields the weaker read. Anything else is `Range`.
fn direction(
    close: Decimal,
    ma20: Decimal,
    ma50: Decimal,
    ma200: Decimal,
    adx: &AdxReading,
) -> TrendDirection {
    let full_up = close > ma20 && ma20 > ma50 && ma50 > ma200;
    let full_down = close < ma20 && ma20 < ma50 && ma50 < ma200;

    if adx.adx > ADX_STRONG {
        if full_up && adx.di_plus > adx.di_minus {
            return TrendDirection::Up;
        }
        if full_down && adx.di_minus > adx.di_plus {
            return TrendDirection::Down;
        }
    }

    if close > ma20 && ma20 > ma50 {
        TrendDirection::Up
    } else if close < ma20 && ma20 < ma50 {
        TrendDirection::Down
    } else {
        TrendDirection::Range
    }
}

#[allow(clippy::too_many_arguments)]
fn score(
    close: Decimal,
    ma20: Decimal,
    ma50: Decimal,
    ma200: Decimal,
    adx: &AdxReading,
    band_width: Decimal,
    macd: &indicators::MacdReading,
    delta: Decimal,
    funding_rate: Decimal,
) -> Decimal {
    let mut total = Decimal::ZERO;

    // Trend ordering quality (0-2): full stack 2, short stack 1.
    let full_up = close > ma20 && ma20 > ma50 && ma50 > ma200;
    let full_down = close < ma20 && ma20 < ma50 && ma50 < ma200;
    let short_up = close > ma20 && ma20 > ma50;
    let short_down = close < ma20 && ma20 < ma50;
    if full_up || full_down {
        total += dec!(2);
    } else if short_up || short_down {
        total += dec!(1);
    }

    // Directional strength (0-2).
    if adx.adx > ADX_STRONG {
        total += dec!(2);
    } else if adx.adx > ADX_MODERATE {
        total += dec!(1);
    }

    // Momentum-histogram confirmation (0-3): growing histogram carries the
    // largest single sub-factor to filter fake breakouts.
    if macd.histogram != Decimal::ZERO {
        total += if macd.rising { dec!(3) } else { dec!(1) };
    }

    // Band-width expansion (0-1).
    if band_width > dec!(0.02) {
        total += dec!(1);
    }

    // Volume-delta confirmation (0-1): either side counts, direction is
    // already carried by the ordering factors.
    if delta.abs() > dec!(0.1) {
        total += dec!(1);
    }

    // Funding-rate anomaly (0-1): crowded funding flags conviction.
    if funding_rate.abs() > dec!(0.0005) {
        total += dec!(1);
    }

    total
}

/// Trend confidence in [0, 1] from ADX and band width.
fn confidence(adx: Decimal, band_width: Decimal) -> Decimal {
    let mut confidence = dec!(0.5);

    if adx > dec!(25) {
        confidence += dec!(0.3);
    } else if adx > dec!(20) {
        confidence += dec!(0.2);
    } else if adx < dec!(15) {
        confidence -= dec!(0.2);
    }

    // Narrow bands often precede trend onset; very wide bands read as chop.
    if band_width < dec!(0.05) {
        confidence += dec!(0.2);
    } else if band_width > dec!(0.15) {
        confidence -= dec!(0.1);
    }

    confidence.clamp(Decimal::ZERO, dec!(1))
}
