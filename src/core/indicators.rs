//! Pure computation module for technical indicators.
//!
//! No I/O, no side effects. Takes candle/price slices and returns indicator
//! values. All computations use `Decimal`; every function degrades to a
//! neutral value on short or malformed input instead of panicking.
//!
//! Indicators implemented:
//! - Moving averages: SMA, EMA (SMA-seeded)
//! - Directional strength: ADX with DI+/DI- (Wilder's smoothing)
//! - Volatility: Bollinger bands + normalized band width, ATR
//! - Flow: VWAP, price-direction-weighted volume delta, OI rate of change
//! - Momentum: MACD histogram
//!
//! References:
//!     Wilder (1978), "New Concepts in Technical Trading Systems".
//!     Appel (2005), "Technical Analysis: Power Tools for Active Investors".

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{Candle, OpenInterestPoint};

// ═══════════════════════════════════════════════════════════════════════════
// Moving averages
// ═══════════════════════════════════════════════════════════════════════════

/// Simple moving average of the trailing `period` prices.
///
/// Returns `None` if there are fewer than `period` prices.
pub fn sma(prices: &[Decimal], period: usize) -> Option<Decimal> {
    if prices.len() < period || period == 0 {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().copied().sum::<Decimal>() / Decimal::from(period as u64))
}

/// Exponential Moving Average series.
///
/// Multiplier `k = 2 / (period + 1)`, seeded with the SMA of the first
/// `period` prices. Returns an empty `Vec` on insufficient data.
pub fn ema_series(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if prices.len() < period || period == 0 {
        return Vec::new();
    }

    let k = dec!(2) / Decimal::from(period as u64 + 1);
    let one_minus_k = dec!(1) - k;

    let seed: Decimal =
        prices[..period].iter().copied().sum::<Decimal>() / Decimal::from(period as u64);

    let mut out = Vec::with_capacity(prices.len() - period + 1);
    out.push(seed);

    for &price in &prices[period..] {
        let prev = *out.last().expect("seeded above");
        out.push(price * k + prev * one_minus_k);
    }

    out
}

/// Latest EMA value, falling back to the last price on short input.
pub fn ema(prices: &[Decimal], period: usize) -> Decimal {
    ema_series(prices, period)
        .last()
        .copied()
        .unwrap_or_else(|| prices.last().copied().unwrap_or(Decimal::ZERO))
}

// ═══════════════════════════════════════════════════════════════════════════
// Directional strength (ADX)
// ═══════════════════════════════════════════════════════════════════════════

/// ADX reading with directional components.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdxReading {
    pub adx: Decimal,
    pub di_plus: Decimal,
    pub di_minus: Decimal,
}

/// Average Directional Index over `period` (Wilder's smoothing).
///
/// Requires at least `2 * period + 1` bars; returns a zero reading below
/// that, which downstream scoring treats as "no directional strength".
pub fn adx(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal], period: usize) -> AdxReading {
    let n = highs.len();
    if period == 0 || n < 2 * period + 1 || lows.len() != n || closes.len() != n {
        return AdxReading::default();
    }

    let mut tr = Vec::with_capacity(n - 1);
    let mut dm_plus = Vec::with_capacity(n - 1);
    let mut dm_minus = Vec::with_capacity(n - 1);

    for i in 1..n {
        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        tr.push(hl.max(hc).max(lc));

        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];

        dm_plus.push(if up_move > down_move && up_move > Decimal::ZERO {
            up_move
        } else {
            Decimal::ZERO
        });
        dm_minus.push(if down_move > up_move && down_move > Decimal::ZERO {
            down_move
        } else {
            Decimal::ZERO
        });
    }

    let period_d = Decimal::from(period as u64);

    // Wilder's running smoothing: s_i = s_{i-1} - s_{i-1}/n + x_i.
    let smooth = |xs: &[Decimal]| -> Vec<Decimal> {
        let mut out = Vec::with_capacity(xs.len() - period + 1);
        let mut sum: Decimal = xs[..period].iter().copied().sum();
        out.push(sum);
        for &x in &xs[period..] {
            sum = sum - sum / period_d + x;
            out.push(sum);
        }
        out
    };

    let sm_tr = smooth(&tr);
    let sm_dmp = smooth(&dm_plus);
    let sm_dmm = smooth(&dm_minus);

    let mut di_plus = Vec::with_capacity(sm_tr.len());
    let mut di_minus = Vec::with_capacity(sm_tr.len());
    let mut dx = Vec::with_capacity(sm_tr.len());

    for i in 0..sm_tr.len() {
        if sm_tr[i] <= Decimal::ZERO {
            di_plus.push(Decimal::ZERO);
            di_minus.push(Decimal::ZERO);
            dx.push(Decimal::ZERO);
            continue;
        }
        let dip = dec!(100) * sm_dmp[i] / sm_tr[i];
        let dim = dec!(100) * sm_dmm[i] / sm_tr[i];
        let di_sum = dip + dim;
        di_plus.push(dip);
        di_minus.push(dim);
        dx.push(if di_sum > Decimal::ZERO {
            dec!(100) * (dip - dim).abs() / di_sum
        } else {
            Decimal::ZERO
        });
    }

    if dx.len() < period {
        return AdxReading::default();
    }

    // First ADX = simple average of the first `period` DX values, then
    // Wilder-smoothed over the remainder.
    let mut adx_val: Decimal =
        dx[..period].iter().copied().sum::<Decimal>() / period_d;
    for &x in &dx[period..] {
        adx_val = (adx_val * (period_d - dec!(1)) + x) / period_d;
    }

    AdxReading {
        adx: adx_val,
        di_plus: *di_plus.last().unwrap_or(&Decimal::ZERO),
        di_minus: *di_minus.last().unwrap_or(&Decimal::ZERO),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Volatility bands
// ═══════════════════════════════════════════════════════════════════════════

/// Bollinger band levels with normalized width.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    /// `(upper - lower) / middle`. Expansion signals rising volatility.
    pub band_width: Decimal,
}

/// Bollinger bands over the trailing `period` prices (population std-dev).
///
/// Falls back to a flat band at the last price on short input.
pub fn bollinger(prices: &[Decimal], period: usize, std_mult: Decimal) -> BollingerBands {
    let fallback = prices.last().copied().unwrap_or(Decimal::ZERO);
    if prices.len() < period || period == 0 {
        return BollingerBands {
            upper: fallback,
            middle: fallback,
            lower: fallback,
            band_width: Decimal::ZERO,
        };
    }

    let window = &prices[prices.len() - period..];
    let period_d = Decimal::from(period as u64);
    let middle: Decimal = window.iter().copied().sum::<Decimal>() / period_d;

    let variance: Decimal = window
        .iter()
        .map(|&p| {
            let diff = p - middle;
            diff * diff
        })
        .sum::<Decimal>()
        / period_d;

    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);
    let upper = middle + std_mult * std_dev;
    let lower = middle - std_mult * std_dev;
    let band_width = if middle > Decimal::ZERO {
        (upper - lower) / middle
    } else {
        Decimal::ZERO
    };

    BollingerBands {
        upper,
        middle,
        lower,
        band_width,
    }
}

/// Average True Range (Wilder's smoothing).
///
/// `TR = max(H-L, |H-prevC|, |L-prevC|)`. Returns `Decimal::ZERO` on
/// mismatched or insufficient data.
pub fn atr(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal], period: usize) -> Decimal {
    let n = highs.len();
    if n < period + 1 || lows.len() != n || closes.len() != n || period == 0 {
        return Decimal::ZERO;
    }

    let true_ranges: Vec<Decimal> = (1..n)
        .map(|i| {
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - closes[i - 1]).abs();
            let lc = (lows[i] - closes[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let period_d = Decimal::from(period as u64);
    let period_m1 = Decimal::from(period as u64 - 1);

    let mut atr_val: Decimal =
        true_ranges[..period].iter().copied().sum::<Decimal>() / period_d;

    for &tr in &true_ranges[period..] {
        atr_val = (atr_val * period_m1 + tr) / period_d;
    }

    atr_val
}

// ═══════════════════════════════════════════════════════════════════════════
// Flow
// ═══════════════════════════════════════════════════════════════════════════

/// Cumulative volume-weighted average price over `candles`.
///
/// Uses the typical price `(H + L + C) / 3`. Returns `None` when total
/// volume is zero.
pub fn vwap(candles: &[Candle]) -> Option<Decimal> {
    let mut pv_sum = Decimal::ZERO;
    let mut v_sum = Decimal::ZERO;

    for c in candles {
        let typical = (c.high + c.low + c.close) / dec!(3);
        pv_sum += typical * c.volume;
        v_sum += c.volume;
    }

    if v_sum > Decimal::ZERO {
        Some(pv_sum / v_sum)
    } else {
        None
    }
}

/// Net buy/sell imbalance in [-1, 1], estimated from price-direction-weighted
/// volume: up-bars count as buy volume, down-bars as sell volume.
pub fn volume_delta(candles: &[Candle]) -> Decimal {
    if candles.len() < 2 {
        return Decimal::ZERO;
    }

    let mut buy_vol = Decimal::ZERO;
    let mut sell_vol = Decimal::ZERO;

    for w in candles.windows(2) {
        let change = w[1].close - w[0].close;
        if change > Decimal::ZERO {
            buy_vol += w[1].volume;
        } else if change < Decimal::ZERO {
            sell_vol += w[1].volume;
        }
    }

    let total = buy_vol + sell_vol;
    if total > Decimal::ZERO {
        (buy_vol - sell_vol) / total
    } else {
        Decimal::ZERO
    }
}

/// Fractional open-interest change over the trailing `lookback` points.
///
/// Returns zero when the series is too short or starts at zero.
pub fn oi_change(history: &[OpenInterestPoint], lookback: usize) -> Decimal {
    if history.len() < 2 || lookback < 2 {
        return Decimal::ZERO;
    }

    let window = if history.len() > lookback {
        &history[history.len() - lookback..]
    } else {
        history
    };

    let start = window[0].sum_open_interest;
    let end = window[window.len() - 1].sum_open_interest;

    if start > Decimal::ZERO {
        (end - start) / start
    } else {
        Decimal::ZERO
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Momentum
// ═══════════════════════════════════════════════════════════════════════════

/// MACD histogram reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacdReading {
    pub line: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
    /// Histogram magnitude growing in its own direction.
    pub rising: bool,
}

/// MACD histogram from `fast`/`slow` EMAs and a `signal` EMA over the line.
///
/// Returns a zero reading on insufficient data.
pub fn macd(prices: &[Decimal], fast: usize, slow: usize, signal: usize) -> MacdReading {
    if prices.len() < slow + signal || fast >= slow {
        return MacdReading::default();
    }

    let fast_ema = ema_series(prices, fast);
    let slow_ema = ema_series(prices, slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return MacdReading::default();
    }

    // Align the two EMA series from the slow start onward.
    let offset = slow - fast;
    let line_series: Vec<Decimal> = (0..slow_ema.len())
        .map(|i| fast_ema[i + offset] - slow_ema[i])
        .collect();

    let signal_series = ema_series(&line_series, signal);
    if signal_series.is_empty() {
        return MacdReading::default();
    }

    let line = *line_series.last().expect("non-empty after ema");
    let sig = *signal_series.last().expect("non-empty checked above");
    let histogram = line - sig;

    // Compare against the previous histogram to detect growing momentum.
    let rising = if line_series.len() >= 2 && signal_series.len() >= 2 {
        let prev_line = line_series[line_series.len() - 2];
        let prev_sig = signal_series[signal_series.len() - 2];
        let prev_hist = prev_line - prev_sig;
        histogram.abs() > prev_hist.abs()
            && (histogram.is_sign_positive() == prev_hist.is_sign_positive()
                || prev_hist == Decimal::ZERO)
    } else {
        false
    };

    MacdReading {
        line,
        signal: sig,
        histogram,
        rising,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(close: Decimal, volume: Decimal) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume,
        }
    }

    // -- SMA / EMA ----------------------------------------------------------

    #[test]
    fn test_sma_basic() {
        let prices: Vec<Decimal> = (1..=5).map(Decimal::from).collect();
        assert_eq!(sma(&prices, 5), Some(dec!(3)));
        assert_eq!(sma(&prices, 2), Some(dec!(4.5)));
    }

    #[test]
    fn test_sma_insufficient() {
        let prices = vec![dec!(1), dec!(2)];
        assert_eq!(sma(&prices, 5), None);
        assert_eq!(sma(&prices, 0), None);
    }

    #[test]
    fn test_ema_series_seed() {
        let prices: Vec<Decimal> = (1..=10).map(Decimal::from).collect();
        let result = ema_series(&prices, 3);
        // First value = SMA of [1,2,3] = 2.
        assert_eq!(result[0], dec!(2));
        assert_eq!(result.len(), 8);
    }

    #[test]
    fn test_ema_fallback_on_short_input() {
        let prices = vec![dec!(7), dec!(8)];
        assert_eq!(ema(&prices, 5), dec!(8));
    }

    // -- ADX ----------------------------------------------------------------

    #[test]
    fn test_adx_insufficient_data() {
        let prices = vec![dec!(100); 10];
        assert_eq!(adx(&prices, &prices, &prices, 14), AdxReading::default());
    }

    #[test]
    fn test_adx_uptrend_di_dominance() {
        // Steadily rising highs/lows: DI+ should dominate DI-.
        let highs: Vec<Decimal> = (0..40).map(|i| Decimal::from(102 + i)).collect();
        let lows: Vec<Decimal> = (0..40).map(|i| Decimal::from(98 + i)).collect();
        let closes: Vec<Decimal> = (0..40).map(|i| Decimal::from(100 + i)).collect();
        let reading = adx(&highs, &lows, &closes, 14);
        assert!(reading.di_plus > reading.di_minus);
        assert!(reading.adx > dec!(20), "strong trend should read ADX > 20, got {}", reading.adx);
    }

    #[test]
    fn test_adx_flat_market() {
        let highs = vec![dec!(101); 40];
        let lows = vec![dec!(99); 40];
        let closes = vec![dec!(100); 40];
        let reading = adx(&highs, &lows, &closes, 14);
        assert_eq!(reading.di_plus, Decimal::ZERO);
        assert_eq!(reading.di_minus, Decimal::ZERO);
    }

    // -- Bollinger ----------------------------------------------------------

    #[test]
    fn test_bollinger_flat_prices() {
        let prices = vec![dec!(100); 20];
        let bb = bollinger(&prices, 20, dec!(2));
        assert_eq!(bb.upper, dec!(100));
        assert_eq!(bb.lower, dec!(100));
        assert_eq!(bb.band_width, Decimal::ZERO);
    }

    #[test]
    fn test_bollinger_insufficient() {
        let prices = vec![dec!(50), dec!(51)];
        let bb = bollinger(&prices, 20, dec!(2));
        assert_eq!(bb.middle, dec!(51));
        assert_eq!(bb.band_width, Decimal::ZERO);
    }

    #[test]
    fn test_bollinger_width_grows_with_dispersion() {
        let tight: Vec<Decimal> = (0..20).map(|i| dec!(100) + Decimal::from(i % 2)).collect();
        let wide: Vec<Decimal> = (0..20).map(|i| dec!(100) + Decimal::from((i % 2) * 10)).collect();
        assert!(bollinger(&wide, 20, dec!(2)).band_width > bollinger(&tight, 20, dec!(2)).band_width);
    }

    // -- ATR ----------------------------------------------------------------

    #[test]
    fn test_atr_basic() {
        let highs: Vec<Decimal> = (0..16).map(|i| Decimal::from(102 + i % 3)).collect();
        let lows: Vec<Decimal> = (0..16).map(|i| Decimal::from(98 - i % 3)).collect();
        let closes: Vec<Decimal> = (0..16).map(|_| dec!(100)).collect();
        assert!(atr(&highs, &lows, &closes, 14) > Decimal::ZERO);
    }

    #[test]
    fn test_atr_mismatched_lengths() {
        let highs = vec![dec!(10), dec!(11)];
        let lows = vec![dec!(9)];
        let closes = vec![dec!(10), dec!(10)];
        assert_eq!(atr(&highs, &lows, &closes, 14), Decimal::ZERO);
    }

    // -- VWAP / delta / OI --------------------------------------------------

    #[test]
    fn test_vwap_weighted_by_volume() {
        let candles = vec![candle(dec!(100), dec!(1)), candle(dec!(200), dec!(3))];
        let v = vwap(&candles).unwrap();
        // Heavier volume at 200 pulls VWAP above the midpoint.
        assert!(v > dec!(150));
    }

    #[test]
    fn test_vwap_zero_volume() {
        let candles = vec![candle(dec!(100), Decimal::ZERO)];
        assert_eq!(vwap(&candles), None);
    }

    #[test]
    fn test_volume_delta_buy_pressure() {
        let candles = vec![
            candle(dec!(100), dec!(10)),
            candle(dec!(101), dec!(30)),
            candle(dec!(100.5), dec!(10)),
        ];
        let delta = volume_delta(&candles);
        assert!(delta > Decimal::ZERO);
        assert!(delta <= dec!(1));
    }

    #[test]
    fn test_volume_delta_short_input() {
        assert_eq!(volume_delta(&[candle(dec!(100), dec!(1))]), Decimal::ZERO);
    }

    #[test]
    fn test_oi_change_window() {
        let history: Vec<OpenInterestPoint> = (0..10)
            .map(|i| OpenInterestPoint {
                timestamp: i,
                sum_open_interest: dec!(100) + Decimal::from(i),
            })
            .collect();
        // Last 6 points: 104 -> 109.
        let change = oi_change(&history, 6);
        assert!((change - dec!(5) / dec!(104)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_oi_change_zero_start() {
        let history = vec![
            OpenInterestPoint { timestamp: 0, sum_open_interest: Decimal::ZERO },
            OpenInterestPoint { timestamp: 1, sum_open_interest: dec!(10) },
        ];
        assert_eq!(oi_change(&history, 6), Decimal::ZERO);
    }

    // -- MACD ---------------------------------------------------------------

    #[test]
    fn test_macd_insufficient_data() {
        let prices: Vec<Decimal> = (1..=10).map(Decimal::from).collect();
        assert_eq!(macd(&prices, 12, 26, 9), MacdReading::default());
    }

    #[test]
    fn test_macd_flat_prices() {
        let prices = vec![dec!(100); 50];
        let reading = macd(&prices, 12, 26, 9);
        assert_eq!(reading.histogram, Decimal::ZERO);
        assert!(!reading.rising);
    }

    #[test]
    fn test_macd_accelerating_uptrend() {
        // Quadratic climb keeps the fast EMA pulling away from the slow one.
        let prices: Vec<Decimal> = (0..60).map(|i| Decimal::from(100 + i * i / 10)).collect();
        let reading = macd(&prices, 12, 26, 9);
        assert!(reading.histogram > Decimal::ZERO);
    }
}
