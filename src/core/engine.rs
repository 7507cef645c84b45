//! Evaluation orchestrator.
//!
//! Wires the scoring pipeline together: macro trend first (its market-type
//! output gates the mid/micro analysis), then factor confirmation and the
//! entry trigger, fusion, and finally position sizing. Market data arrives
//! through the injected [`MarketDataSource`]; those fetches are the only
//! suspension points; the scoring math itself never blocks.
//!
//! Evaluations for different symbols are independent; the only shared
//! mutable state is the weight learner's per-symbol counters.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::core::adaptive_weights::WeightLearner;
use crate::core::range_boundary::{self, RangeBoundary};
use crate::core::{execution_scorer, factor_scorer, fusion, trade_params, trend_scorer};
use crate::errors::EngineError;
use crate::types::{
    AuxiliaryData, Candle, ExecutionAnalysis, FactorAnalysis, MarketType, OpenInterestPoint,
    Signal, StrategyEvaluation, Ticker24h, Timeframe, TradeParameters, TrendAnalysis,
};

/// Open-interest history points fetched per evaluation.
const OI_HISTORY_POINTS: usize = 7;

/// Market-data collaborator. Implementations own all I/O and rate limiting.
pub trait MarketDataSource: Send + Sync {
    fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Candle>, EngineError>> + Send;

    fn funding_rate(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<Option<Decimal>, EngineError>> + Send;

    fn open_interest(
        &self,
        symbol: &str,
        points: usize,
    ) -> impl std::future::Future<Output = Result<Vec<OpenInterestPoint>, EngineError>> + Send;

    fn ticker(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<Option<Ticker24h>, EngineError>> + Send;
}

/// Signal fusion engine over an injected market-data source.
pub struct FusionEngine<S> {
    source: S,
    learner: WeightLearner,
    config: EngineConfig,
}

impl<S: MarketDataSource> FusionEngine<S> {
    pub fn new(source: S, learner: WeightLearner, config: EngineConfig) -> Self {
        Self {
            source,
            learner,
            config,
        }
    }

    /// Access the weight learner (for recording realized trade outcomes).
    pub fn learner(&self) -> &WeightLearner {
        &self.learner
    }

    /// Run one full evaluation for a symbol.
    ///
    /// Per-component failures degrade to neutral results; only a macro
    /// scorer failure surfaces as [`Signal::Error`], since direction is
    /// unknown without it.
    pub async fn evaluate(&self, symbol: &str) -> StrategyEvaluation {
        let now = now_ms();

        // Macro candles are load-bearing: a fetch failure means direction
        // is unknowable this cycle.
        let macro_candles = match self
            .source
            .candles(symbol, Timeframe::H4, Timeframe::H4.fetch_candles())
            .await
        {
            Ok(candles) => candles,
            Err(e) => return self.error_evaluation(symbol, e.to_string(), now),
        };

        let aux = self.fetch_auxiliary(symbol).await;

        let trend = trend_scorer::analyze_trend(&macro_candles, &aux);
        if trend.error.is_some() && macro_candles.len() >= Timeframe::H4.min_candles() {
            // Enough data but the computation itself failed.
            let message = trend.error.clone().unwrap_or_default();
            return self.error_evaluation(symbol, message, now);
        }

        let market_type = trend.market_type;

        let mid_candles = self
            .source
            .candles(symbol, Timeframe::H1, Timeframe::H1.fetch_candles())
            .await
            .unwrap_or_else(|e| {
                warn!(symbol, error = %e, "1h candles unavailable");
                Vec::new()
            });
        let micro_candles = self
            .source
            .candles(symbol, Timeframe::M15, Timeframe::M15.fetch_candles())
            .await
            .unwrap_or_else(|e| {
                warn!(symbol, error = %e, "15m candles unavailable");
                Vec::new()
            });

        // Range markets additionally need validated boundaries before the
        // micro window may trigger.
        let boundary: Option<RangeBoundary> = if market_type == MarketType::Range {
            match range_boundary::analyze_range_boundary(&mid_candles, &aux) {
                Ok(b) => Some(b),
                Err(e) => {
                    debug!(symbol, error = %e, "range boundary unavailable");
                    None
                }
            }
        } else {
            None
        };

        let factors = factor_scorer::analyze_factors(
            symbol,
            &mid_candles,
            &aux,
            trend.direction,
            &self.learner,
        );
        let execution = execution_scorer::analyze_execution(
            &micro_candles,
            trend.direction,
            market_type,
            boundary.as_ref(),
        );

        let decision = fusion::fuse(&trend, &factors, &execution, &self.config.fusion);

        let params = if decision.signal.is_actionable() {
            let entry_price = if execution.entry_price > Decimal::ZERO {
                execution.entry_price
            } else {
                micro_candles
                    .last()
                    .map(|c| c.close)
                    .unwrap_or(Decimal::ZERO)
            };
            trade_params::trade_parameters(
                symbol,
                decision.signal,
                entry_price,
                trend.snapshot.atr,
                execution.atr,
                market_type,
                decision.tier.unwrap_or_default(),
                self.config.risk.max_loss_usd,
            )
        } else {
            TradeParameters::zeroed()
        };

        StrategyEvaluation {
            symbol: symbol.to_string(),
            signal: decision.signal,
            market_type,
            trend,
            factors,
            execution,
            decision: Some(decision),
            params,
            error: None,
            timestamp: now,
        }
    }

    /// Evaluation loop: score every configured symbol each round, emit the
    /// results to the event channel.
    pub async fn run(
        &self,
        event_tx: mpsc::Sender<StrategyEvaluation>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let interval = tokio::time::Duration::from_secs(self.config.evaluation.interval_secs);

        info!(
            symbols = ?self.config.evaluation.symbols,
            interval_s = interval.as_secs(),
            "fusion engine started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("fusion engine shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    for symbol in &self.config.evaluation.symbols {
                        let evaluation = self.evaluate(symbol).await;

                        match evaluation.signal {
                            Signal::Buy | Signal::Sell => info!(
                                symbol = %evaluation.symbol,
                                signal = evaluation.signal.as_str(),
                                score = evaluation.decision.as_ref()
                                    .map(|d| d.normalized_score)
                                    .unwrap_or(0),
                                leverage = evaluation.params.leverage,
                                "signal emitted"
                            ),
                            Signal::Hold => debug!(
                                symbol = %evaluation.symbol,
                                "no signal this cycle"
                            ),
                            Signal::Error => warn!(
                                symbol = %evaluation.symbol,
                                error = evaluation.error.as_deref().unwrap_or("unknown"),
                                "evaluation error"
                            ),
                        }

                        if event_tx.send(evaluation).await.is_err() {
                            error!("evaluation channel closed, stopping engine");
                            return Ok(());
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetch optional auxiliary data; failures degrade to absence.
    async fn fetch_auxiliary(&self, symbol: &str) -> AuxiliaryData {
        let funding_rate = match self.source.funding_rate(symbol).await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(symbol, error = %e, "funding rate unavailable");
                None
            }
        };

        let open_interest = match self.source.open_interest(symbol, OI_HISTORY_POINTS).await {
            Ok(points) => points,
            Err(e) => {
                warn!(symbol, error = %e, "open interest unavailable");
                Vec::new()
            }
        };

        let ticker = match self.source.ticker(symbol).await {
            Ok(t) => t,
            Err(e) => {
                warn!(symbol, error = %e, "ticker unavailable");
                None
            }
        };

        AuxiliaryData {
            funding_rate,
            open_interest,
            ticker,
        }
    }

    fn error_evaluation(
        &self,
        symbol: &str,
        message: String,
        timestamp: i64,
    ) -> StrategyEvaluation {
        warn!(symbol, error = %message, "macro analysis failed");
        StrategyEvaluation {
            symbol: symbol.to_string(),
            signal: Signal::Error,
            market_type: MarketType::Range,
            trend: TrendAnalysis::degraded(message.clone()),
            factors: FactorAnalysis::degraded(message.clone()),
            execution: ExecutionAnalysis::degraded(message.clone()),
            decision: None,
            params: TradeParameters::zeroed(),
            error: Some(message),
            timestamp,
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Canned-data source for pipeline tests.
    struct MockSource {
        macro_candles: Vec<Candle>,
        mid_candles: Vec<Candle>,
        micro_candles: Vec<Candle>,
        funding: Option<Decimal>,
        oi: Vec<OpenInterestPoint>,
        fail_macro: bool,
        fail_aux: bool,
    }

    impl MockSource {
        fn new(
            macro_candles: Vec<Candle>,
            mid_candles: Vec<Candle>,
            micro_candles: Vec<Candle>,
        ) -> Self {
            Self {
                macro_candles,
                mid_candles,
                micro_candles,
                funding: Some(dec!(0.0001)),
                oi: Vec::new(),
                fail_macro: false,
                fail_aux: false,
            }
        }
    }

    impl MarketDataSource for MockSource {
        async fn candles(
            &self,
            _symbol: &str,
            timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<Candle>, EngineError> {
            match timeframe {
                Timeframe::H4 if self.fail_macro => {
                    Err(EngineError::DataUnavailable("kline endpoint down".into()))
                }
                Timeframe::H4 => Ok(self.macro_candles.clone()),
                Timeframe::H1 => Ok(self.mid_candles.clone()),
                Timeframe::M15 => Ok(self.micro_candles.clone()),
            }
        }

        async fn funding_rate(&self, _symbol: &str) -> Result<Option<Decimal>, EngineError> {
            if self.fail_aux {
                return Err(EngineError::DataUnavailable("funding endpoint down".into()));
            }
            Ok(self.funding)
        }

        async fn open_interest(
            &self,
            _symbol: &str,
            _points: usize,
        ) -> Result<Vec<OpenInterestPoint>, EngineError> {
            if self.fail_aux {
                return Err(EngineError::DataUnavailable("oi endpoint down".into()));
            }
            Ok(self.oi.clone())
        }

        async fn ticker(&self, _symbol: &str) -> Result<Option<Ticker24h>, EngineError> {
            Ok(None)
        }
    }

    fn candle(i: usize, close: Decimal) -> Candle {
        Candle {
            open_time: i as i64 * 60_000,
            open: close - dec!(0.5),
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: dec!(1000),
        }
    }

    fn rising(n: usize, step: Decimal) -> Vec<Candle> {
        (0..n)
            .map(|i| candle(i, dec!(100) + step * Decimal::from(i as u64)))
            .collect()
    }

    /// Accelerating climb: keeps the momentum histogram growing so the
    /// macro window scores high enough to clear the strong-tier bar.
    fn accelerating(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = dec!(100) + Decimal::from((i * i) as u64) / dec!(100);
                candle(i, close)
            })
            .collect()
    }

    fn engine(source: MockSource) -> FusionEngine<MockSource> {
        FusionEngine::new(source, WeightLearner::in_memory(), EngineConfig::default())
    }

    #[tokio::test]
    async fn test_macro_fetch_failure_yields_error_signal() {
        let mut source = MockSource::new(rising(250, dec!(1)), rising(60, dec!(1)), rising(50, dec!(1)));
        source.fail_macro = true;
        let evaluation = engine(source).evaluate("BTCUSDT").await;
        assert_eq!(evaluation.signal, Signal::Error);
        assert!(evaluation.error.is_some());
        assert_eq!(evaluation.params.leverage, 0);
    }

    #[tokio::test]
    async fn test_short_macro_series_holds() {
        // 150 macro candles: degraded trend, fusion holds, not an error.
        let source = MockSource::new(rising(150, dec!(1)), rising(60, dec!(1)), rising(50, dec!(1)));
        let evaluation = engine(source).evaluate("BTCUSDT").await;
        assert_eq!(evaluation.signal, Signal::Hold);
        assert_eq!(evaluation.trend.score, Decimal::ZERO);
        assert_eq!(evaluation.market_type, MarketType::Range);
    }

    #[tokio::test]
    async fn test_aligned_uptrend_emits_buy_with_params() {
        let source = MockSource::new(accelerating(250), rising(60, dec!(1)), rising(50, dec!(1)));
        let evaluation = engine(source).evaluate("BTCUSDT").await;

        assert_eq!(evaluation.signal, Signal::Buy, "decision: {:?}", evaluation.decision);
        assert_eq!(evaluation.market_type, MarketType::Trend);
        let params = &evaluation.params;
        assert!(params.entry_price > Decimal::ZERO);
        assert!(params.stop_loss < params.entry_price);
        assert!(params.take_profit > params.entry_price);
        assert!(params.leverage >= 1 && params.leverage <= 24);
        assert!(params.margin > Decimal::ZERO);
        assert!(params.time_stop_minutes > 0);
    }

    #[tokio::test]
    async fn test_aux_failures_degrade_not_crash() {
        let mut source = MockSource::new(accelerating(250), rising(60, dec!(1)), rising(50, dec!(1)));
        source.fail_aux = true;
        let evaluation = engine(source).evaluate("BTCUSDT").await;
        // Pipeline completes; missing aux only weakens the scores.
        assert_ne!(evaluation.signal, Signal::Error);
        assert!(evaluation.error.is_none());
    }

    #[tokio::test]
    async fn test_run_loop_emits_and_stops() {
        let source = MockSource::new(rising(250, dec!(1)), rising(60, dec!(1)), rising(50, dec!(1)));
        let mut config = EngineConfig::default();
        config.evaluation.symbols = vec!["BTCUSDT".into()];
        config.evaluation.interval_secs = 0;
        let engine = FusionEngine::new(source, WeightLearner::in_memory(), config);

        let (tx, mut rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        let received = tokio::spawn(async move {
            let evaluation = rx.recv().await;
            stop.cancel();
            evaluation
        });

        engine.run(tx, shutdown).await.unwrap();
        let evaluation = received.await.unwrap().expect("one evaluation emitted");
        assert_eq!(evaluation.symbol, "BTCUSDT");
    }
}
