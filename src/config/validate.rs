use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::EngineConfig;

/// Validate a loaded configuration.
///
/// Rejects configurations that would make the engine silently inert
/// (non-positive budget, inverted tier bands) rather than letting them
/// surface as puzzling HOLD streaks at runtime.
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if config.evaluation.symbols.is_empty() {
        bail!("evaluation.symbols must not be empty");
    }

    if config.risk.max_loss_usd <= Decimal::ZERO {
        bail!(
            "risk.max_loss_usd must be positive, got {}",
            config.risk.max_loss_usd
        );
    }

    let bands = &config.fusion.score_bands;
    if !(bands.strong > bands.moderate && bands.moderate > bands.weak) {
        bail!(
            "fusion.score_bands must be strictly descending (strong {} > moderate {} > weak {})",
            bands.strong,
            bands.moderate,
            bands.weak
        );
    }
    if bands.weak < Decimal::ZERO {
        bail!("fusion.score_bands.weak must be non-negative");
    }

    let trend_bars = &config.fusion.trend_bars;
    if !(trend_bars.strong >= trend_bars.moderate && trend_bars.moderate >= trend_bars.weak) {
        bail!("fusion.trend_bars must be descending across tiers");
    }

    let entry_bars = &config.fusion.entry_bars;
    if !(entry_bars.strong >= entry_bars.moderate && entry_bars.moderate >= entry_bars.weak) {
        bail!("fusion.entry_bars must be descending across tiers");
    }

    if config.fusion.threshold_floor <= Decimal::ZERO {
        bail!(
            "fusion.threshold_floor must be positive, got {}",
            config.fusion.threshold_floor
        );
    }

    Ok(())
}
