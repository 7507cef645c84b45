use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::timeframe::MarketType;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }

    /// Unrealized PnL per unit at `current_price`.
    #[must_use]
    pub fn unrealized_pnl(&self, entry_price: Decimal, current_price: Decimal) -> Decimal {
        match self {
            Self::Long => current_price - entry_price,
            Self::Short => entry_price - current_price,
        }
    }
}

/// An open position as seen by the duration policy.
///
/// The engine only reads this to decide duration/time-stop exits; it does
/// not own position lifecycle or storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: PositionSide,
    #[serde(with = "rust_decimal::serde::str")]
    pub entry_price: Decimal,
    /// Entry time in epoch milliseconds.
    pub entry_time: i64,
    pub market_type: MarketType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unrealized_pnl_sides() {
        assert_eq!(
            PositionSide::Long.unrealized_pnl(dec!(100), dec!(105)),
            dec!(5)
        );
        assert_eq!(
            PositionSide::Short.unrealized_pnl(dec!(100), dec!(105)),
            dec!(-5)
        );
        assert_eq!(
            PositionSide::Short.unrealized_pnl(dec!(100), dec!(90)),
            dec!(10)
        );
    }
}
