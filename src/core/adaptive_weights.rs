//! Adaptive factor-weight learner.
//!
//! Tracks per-symbol, per-factor trigger/win counts from realized trade
//! outcomes and converts the accumulated win rate into a multiplicative
//! adjustment of a base weight vector. Weights only start drifting once a
//! factor has a minimum sample size, preventing oscillation on cold-start
//! data while letting weights move toward factors with demonstrated edge.
//!
//! The counter store sits behind [`FactorStatsStore`] so tests use the
//! in-memory map and production can swap in a durable store without
//! touching the scoring logic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::constants::{MIN_FACTOR_SAMPLES, WEIGHT_ADJUST_ALPHA};
use crate::core::category::Factor;

/// Trigger/win counters for one factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCounter {
    pub wins: u32,
    pub total: u32,
}

impl FactorCounter {
    /// Win rate, or `None` below the minimum sample size.
    #[must_use]
    pub fn win_rate(&self) -> Option<Decimal> {
        if self.total < MIN_FACTOR_SAMPLES {
            return None;
        }
        Some(Decimal::from(self.wins) / Decimal::from(self.total))
    }
}

/// Counter storage keyed by symbol and factor.
///
/// Implementations must serialize concurrent writes to the same symbol's
/// counters; reads need not be transactional with respect to writes.
pub trait FactorStatsStore: Send + Sync {
    /// Record one outcome for a triggered factor.
    fn record(&self, symbol: &str, factor: Factor, win: bool);

    /// Snapshot of all counters for a symbol.
    fn snapshot(&self, symbol: &str) -> HashMap<Factor, FactorCounter>;
}

/// In-memory counter store. Counters grow monotonically and are never
/// pruned; age-based pruning belongs to a durable store implementation.
#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    inner: RwLock<HashMap<String, HashMap<Factor, FactorCounter>>>,
}

impl InMemoryStatsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FactorStatsStore for InMemoryStatsStore {
    fn record(&self, symbol: &str, factor: Factor, win: bool) {
        let mut guard = self.inner.write().expect("stats lock poisoned");
        let counter = guard
            .entry(symbol.to_string())
            .or_default()
            .entry(factor)
            .or_default();
        counter.total += 1;
        if win {
            counter.wins += 1;
        }
    }

    fn snapshot(&self, symbol: &str) -> HashMap<Factor, FactorCounter> {
        self.inner
            .read()
            .expect("stats lock poisoned")
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }
}

/// Weight learner over an injectable counter store.
#[derive(Clone)]
pub struct WeightLearner {
    store: Arc<dyn FactorStatsStore>,
}

impl WeightLearner {
    #[must_use]
    pub fn new(store: Arc<dyn FactorStatsStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStatsStore::new()))
    }

    /// Record a realized trade outcome against the factors that triggered.
    ///
    /// Untriggered factors are untouched: absence of evidence is not
    /// evidence of absence.
    pub fn record_factor_performance(
        &self,
        symbol: &str,
        triggered: &[(Factor, bool)],
        win: bool,
    ) {
        for (factor, was_triggered) in triggered {
            if *was_triggered {
                self.store.record(symbol, *factor, win);
            }
        }
    }

    /// Win rates for factors that have reached the minimum sample size.
    #[must_use]
    pub fn factor_win_rates(&self, symbol: &str) -> HashMap<Factor, Decimal> {
        self.store
            .snapshot(symbol)
            .into_iter()
            .filter_map(|(factor, counter)| counter.win_rate().map(|rate| (factor, rate)))
            .collect()
    }

    /// Base weights re-weighted by historical factor win rate.
    ///
    /// Returns `base` unchanged (bit-for-bit) while no factor has enough
    /// samples, so cold-start evaluations are identical to the static
    /// tables.
    #[must_use]
    pub fn adjusted_weights(
        &self,
        symbol: &str,
        base: &[(Factor, Decimal)],
    ) -> Vec<(Factor, Decimal)> {
        let rates = self.factor_win_rates(symbol);
        if rates.is_empty() {
            return base.to_vec();
        }
        debug!(symbol, factors = rates.len(), "applying learned factor weights");
        adjust_weights(base, &rates, WEIGHT_ADJUST_ALPHA)
    }
}

/// Scale each known factor's weight by `1 + alpha * (win_rate - 0.5)` and
/// renormalize the vector to sum to 1.
///
/// A factor trusted above a 50% win rate is up-weighted linearly in
/// `(rate - 0.5)`; `alpha` bounds the swing to `±alpha/2` at the extremes.
/// Factors without a known rate keep their base weight through the
/// renormalization.
#[must_use]
pub fn adjust_weights(
    base: &[(Factor, Decimal)],
    win_rates: &HashMap<Factor, Decimal>,
    alpha: Decimal,
) -> Vec<(Factor, Decimal)> {
    let mut adjusted: Vec<(Factor, Decimal)> = base
        .iter()
        .map(|(factor, weight)| {
            let scaled = match win_rates.get(factor) {
                Some(rate) => *weight * (dec!(1) + alpha * (*rate - dec!(0.5))),
                None => *weight,
            };
            (*factor, scaled)
        })
        .collect();

    let total: Decimal = adjusted.iter().map(|(_, w)| *w).sum();
    if total > Decimal::ZERO {
        for (_, weight) in &mut adjusted {
            *weight /= total;
        }
    }

    adjusted
}
