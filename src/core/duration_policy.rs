//! Holding-duration and risk policy per symbol category and market type.
//!
//! Static policy table covering max/min holding duration, the time-stop
//! interval and ATR multiples for stop/target legs. Exposes duration-based
//! stop/target computation and two independent lifecycle checks:
//! max-duration eviction and the time-stop for unprofitable positions.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::category::Category;
use crate::types::{ConfidenceTier, MarketType, OpenPosition, PositionSide};

/// Per-(category, market-type) holding policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPolicy {
    #[serde(with = "rust_decimal::serde::str")]
    pub max_duration_hours: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_duration_hours: Decimal,
    pub time_stop_minutes: u32,
    /// Take-profit distance in ATR multiples.
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_target_atr: Decimal,
    /// Stop-loss distance in ATR multiples.
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_loss_atr: Decimal,
}

const fn policy(
    max_duration_hours: Decimal,
    min_duration_hours: Decimal,
    time_stop_minutes: u32,
    profit_target_atr: Decimal,
    stop_loss_atr: Decimal,
) -> PositionPolicy {
    PositionPolicy {
        max_duration_hours,
        min_duration_hours,
        time_stop_minutes,
        profit_target_atr,
        stop_loss_atr,
    }
}

/// Holding policy for a `(category, market_type)` pair.
///
/// Majors are allowed to ride trends for up to a week; everything else is
/// held on a short leash.
#[must_use]
pub fn category_policy(category: Category, market_type: MarketType) -> PositionPolicy {
    match (category, market_type) {
        (Category::Mainstream, MarketType::Trend) => {
            policy(dec!(168), dec!(24), 60, dec!(4.5), dec!(0.5))
        }
        (Category::Mainstream, MarketType::Range) => {
            policy(dec!(12), dec!(1), 30, dec!(4.5), dec!(0.5))
        }
        (Category::HighCapTrend, MarketType::Trend) => {
            policy(dec!(4), dec!(1), 120, dec!(6.0), dec!(0.7))
        }
        (Category::HighCapTrend, MarketType::Range) => {
            policy(dec!(4), dec!(1), 45, dec!(6.0), dec!(0.7))
        }
        (Category::Hot, MarketType::Trend) => {
            policy(dec!(4), dec!(1), 180, dec!(7.5), dec!(0.8))
        }
        (Category::Hot, MarketType::Range) => {
            policy(dec!(4), dec!(1), 60, dec!(7.5), dec!(0.8))
        }
        (Category::SmallCap, MarketType::Trend) => {
            policy(dec!(4), dec!(0.5), 30, dec!(4.5), dec!(0.5))
        }
        (Category::SmallCap, MarketType::Range) => {
            policy(dec!(4), dec!(0.5), 30, dec!(4.5), dec!(0.5))
        }
    }
}

/// Holding policy for a symbol, resolved through the category classifier.
#[must_use]
pub fn position_config(symbol: &str, market_type: MarketType) -> PositionPolicy {
    category_policy(Category::classify(symbol), market_type)
}

/// Stop/target levels derived from the duration policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationStops {
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_loss: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub take_profit: Decimal,
    pub time_stop_minutes: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_duration_hours: Decimal,
}

/// Compute duration-based stop-loss and take-profit for an entry.
///
/// Both legs scale with the confidence tier: lower confidence widens them
/// proportionally.
#[must_use]
pub fn duration_stop_levels(
    symbol: &str,
    side: PositionSide,
    entry_price: Decimal,
    atr: Decimal,
    market_type: MarketType,
    tier: ConfidenceTier,
) -> DurationStops {
    let policy = position_config(symbol, market_type);
    let multiplier = tier.width_multiplier();

    let stop_distance = atr * policy.stop_loss_atr * multiplier;
    let target_distance = atr * policy.profit_target_atr * multiplier;

    let (stop_loss, take_profit) = match side {
        PositionSide::Long => (entry_price - stop_distance, entry_price + target_distance),
        PositionSide::Short => (entry_price + stop_distance, entry_price - target_distance),
    };

    DurationStops {
        stop_loss,
        take_profit,
        time_stop_minutes: policy.time_stop_minutes,
        max_duration_hours: policy.max_duration_hours,
    }
}

/// Result of the max-duration check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationCheck {
    pub exceeded: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub hours_held: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_hours: Decimal,
    /// Raised within the final hour before the limit.
    pub warning: bool,
}

/// Check whether a position exceeded its maximum holding duration.
///
/// `now_ms` is the current epoch time in milliseconds, injected for
/// determinism.
#[must_use]
pub fn check_max_duration(position: &OpenPosition, now_ms: i64) -> DurationCheck {
    let policy = position_config(&position.symbol, position.market_type);

    let elapsed_ms = now_ms.saturating_sub(position.entry_time).max(0);
    let hours_held = Decimal::from(elapsed_ms) / dec!(3600000);

    let exceeded = hours_held >= policy.max_duration_hours;
    let warning = !exceeded && hours_held >= policy.max_duration_hours - dec!(1);

    if exceeded {
        warn!(
            symbol = %position.symbol,
            hours_held = %hours_held.round_dp(2),
            max_hours = %policy.max_duration_hours,
            "position exceeded max holding duration"
        );
    } else if warning {
        debug!(
            symbol = %position.symbol,
            hours_held = %hours_held.round_dp(2),
            max_hours = %policy.max_duration_hours,
            "position approaching max holding duration"
        );
    }

    DurationCheck {
        exceeded,
        hours_held,
        max_hours: policy.max_duration_hours,
        warning,
    }
}

/// Result of the time-stop check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeStopCheck {
    pub triggered: bool,
    pub minutes_held: u64,
    pub threshold_minutes: u32,
    /// Unrealized PnL was positive at evaluation time.
    pub profitable: bool,
}

/// Check the time stop: exits "dead" trades, not winning ones held long.
///
/// Only evaluated once the holding time reaches the policy interval, and
/// only triggers while the position is flat or under water.
#[must_use]
pub fn check_time_stop(
    position: &OpenPosition,
    current_price: Decimal,
    now_ms: i64,
) -> TimeStopCheck {
    let policy = position_config(&position.symbol, position.market_type);

    let elapsed_ms = now_ms.saturating_sub(position.entry_time).max(0);
    let minutes_held = (elapsed_ms / 60_000) as u64;

    if minutes_held < u64::from(policy.time_stop_minutes) {
        return TimeStopCheck {
            triggered: false,
            minutes_held,
            threshold_minutes: policy.time_stop_minutes,
            profitable: false,
        };
    }

    let pnl = position
        .side
        .unrealized_pnl(position.entry_price, current_price);
    let profitable = pnl > Decimal::ZERO;

    if !profitable {
        debug!(
            symbol = %position.symbol,
            minutes_held,
            "time stop triggered on unprofitable position"
        );
    }

    TimeStopCheck {
        triggered: !profitable,
        minutes_held,
        threshold_minutes: policy.time_stop_minutes,
        profitable,
    }
}
