pub mod market_data;
pub mod position;
pub mod signal;
pub mod timeframe;

pub use market_data::{AuxiliaryData, Candle, OpenInterestPoint, Ticker24h};
pub use position::{OpenPosition, PositionSide};
pub use signal::{
    BlendWeights, EntryMode, ExecutionAnalysis, FactorAnalysis, FactorFlags, FusionDecision,
    Signal, StrategyEvaluation, TierThresholds, TradeParameters, TrendAnalysis, TrendDirection,
    TrendSnapshot,
};
pub use timeframe::{ConfidenceTier, MarketType, Timeframe};
