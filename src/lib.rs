//! Multi-timeframe signal fusion and risk-parameterization engine.
//!
//! Scores three candle granularities independently (macro trend context
//! (4H), mid-timeframe factor confirmation (1H) and the micro entry trigger
//! (15M)), fuses them into one directional decision through dynamic
//! weighting, score compensation and adaptive thresholds, and converts an
//! accepted signal into bounded sizing parameters (stop, target, leverage,
//! margin) under a fixed maximum-loss budget and a category-dependent
//! holding-duration policy.
//!
//! Market data and persistence are external collaborators behind the
//! [`MarketDataSource`] and [`FactorStatsStore`] traits; everything in this
//! crate is pure CPU-bound computation plus one small piece of learned
//! state (per-symbol factor win-rate counters).

pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod logging;
pub mod types;

pub use crate::config::EngineConfig;
pub use crate::core::adaptive_weights::{FactorStatsStore, InMemoryStatsStore, WeightLearner};
pub use crate::core::category::{Category, Factor};
pub use crate::core::engine::{FusionEngine, MarketDataSource};
pub use crate::errors::{EngineError, ScoreError};
pub use crate::types::{Signal, StrategyEvaluation, TradeParameters};
