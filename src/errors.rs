use thiserror::Error;

use crate::types::Timeframe;

/// Failure inside a single scorer sub-computation.
///
/// Errors are contained at the smallest component boundary and converted to
/// a degraded-but-valid result; nothing in the scoring core propagates an
/// error past its own function boundary during evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("insufficient {timeframe} data: {have} candles, need {need}")]
    InsufficientData {
        timeframe: Timeframe,
        have: usize,
        need: usize,
    },

    #[error("computation failed: {context}")]
    Computation { context: String },
}

impl ScoreError {
    pub fn computation(context: impl Into<String>) -> Self {
        Self::Computation {
            context: context.into(),
        }
    }
}

/// Errors surfaced by the engine shell (data fetching, configuration).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
