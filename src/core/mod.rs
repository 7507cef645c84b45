pub mod adaptive_weights;
pub mod category;
pub mod duration_policy;
pub mod engine;
pub mod execution_scorer;
pub mod factor_scorer;
pub mod fusion;
pub mod indicators;
pub mod range_boundary;
pub mod trade_params;
pub mod trend_scorer;
