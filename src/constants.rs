//! Hard limits and learner constants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hard ceiling on computed leverage.
pub const MAX_LEVERAGE: u32 = 24;

/// Adverse-execution buffer added to the stop distance before the leverage
/// division, so a fill at the stop cannot instantly liquidate the position.
pub const SLIPPAGE_BUFFER: Decimal = dec!(0.005);

/// Default maximum acceptable loss per trade in USD (overridable via config).
pub const DEFAULT_MAX_LOSS_USD: Decimal = dec!(100);

/// Minimum recorded outcomes before a factor's win rate is trusted.
pub const MIN_FACTOR_SAMPLES: u32 = 10;

/// Scale of the win-rate weight adjustment. At a 100% win rate a factor's
/// weight grows by `1 + 0.5 * alpha`; at 0% it shrinks symmetrically.
pub const WEIGHT_ADJUST_ALPHA: Decimal = dec!(0.25);

/// ATR fallback as a fraction of entry price when no ATR is available.
pub const ATR_PRICE_FALLBACK: Decimal = dec!(0.01);
