//! Position sizing and trade parameter calculator.
//!
//! Converts an accepted signal into bounded sizing parameters: stop/target
//! from the duration policy, then leverage and margin constrained by a
//! fixed maximum-loss budget. Sizing failures never panic or error; they
//! yield all-zero parameters the caller treats as non-actionable.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::constants::{ATR_PRICE_FALLBACK, MAX_LEVERAGE, SLIPPAGE_BUFFER};
use crate::core::duration_policy;
use crate::types::{
    ConfidenceTier, MarketType, PositionSide, Signal, TradeParameters,
};

/// Compute trade parameters for an accepted signal.
///
/// ATR preference: the macro-window ATR for stability, falling back to the
/// micro-window ATR, then to 1% of entry when both are unusable.
pub fn trade_parameters(
    symbol: &str,
    signal: Signal,
    entry_price: Decimal,
    macro_atr: Decimal,
    micro_atr: Decimal,
    market_type: MarketType,
    tier: ConfidenceTier,
    max_loss_usd: Decimal,
) -> TradeParameters {
    let side = match signal {
        Signal::Buy => PositionSide::Long,
        Signal::Sell => PositionSide::Short,
        Signal::Hold | Signal::Error => return TradeParameters::zeroed(),
    };

    if entry_price <= Decimal::ZERO {
        warn!(symbol, "sizing skipped: missing entry price");
        return TradeParameters::zeroed();
    }

    let atr = if macro_atr > Decimal::ZERO {
        macro_atr
    } else if micro_atr > Decimal::ZERO {
        micro_atr
    } else {
        entry_price * ATR_PRICE_FALLBACK
    };

    let stops =
        duration_policy::duration_stop_levels(symbol, side, entry_price, atr, market_type, tier);

    // Stop distance as a fraction of entry; positive by construction.
    let stop_distance = match side {
        PositionSide::Long => (entry_price - stops.stop_loss) / entry_price,
        PositionSide::Short => (stops.stop_loss - entry_price) / entry_price,
    };
    if stop_distance <= Decimal::ZERO {
        warn!(symbol, "sizing skipped: degenerate stop distance");
        return TradeParameters::zeroed();
    }

    // Max leverage: 1 / (distance + buffer), floored, clamped to [1, cap].
    // The buffer reserves headroom so slippage at the stop cannot liquidate
    // the position.
    let leverage = (dec!(1) / (stop_distance + SLIPPAGE_BUFFER))
        .floor()
        .to_u32()
        .unwrap_or(1)
        .clamp(1, MAX_LEVERAGE);

    // Min margin: the loss at a stop-out (margin * leverage * distance)
    // stays within the configured budget.
    let margin = (max_loss_usd / (Decimal::from(leverage) * stop_distance)).ceil();
    if margin <= Decimal::ZERO {
        return TradeParameters::zeroed();
    }

    TradeParameters {
        entry_price,
        stop_loss: stops.stop_loss,
        take_profit: stops.take_profit,
        leverage,
        margin,
        time_stop_minutes: stops.time_stop_minutes,
        max_duration_hours: stops.max_duration_hours,
    }
}
