pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load `engine.json` from `config_dir`, apply environment overrides and
/// validate.
///
/// Missing file is not an error: defaults apply, overrides still run. This
/// keeps embedded/test usage config-free while production mounts a config
/// directory.
///
/// # Environment variable overrides
///
/// | Env Var              | Config Field                  |
/// |----------------------|-------------------------------|
/// | `MAX_LOSS_USD`       | `risk.max_loss_usd`           |
/// | `EVAL_INTERVAL_SECS` | `evaluation.interval_secs`    |
/// | `EVAL_SYMBOLS`       | `evaluation.symbols` (comma-separated) |
/// | `LOG_DIR`            | `logging.log_dir`             |
pub fn load_config(config_dir: &Path) -> Result<EngineConfig> {
    let path = config_dir.join("engine.json");

    let mut config: EngineConfig = if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?
    } else {
        EngineConfig::default()
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect; parse failures leave the configured
/// value in place.
fn apply_env_overrides(config: &mut EngineConfig) {
    if let Some(val) = env_parse::<Decimal>("MAX_LOSS_USD") {
        info!(%val, "env override: MAX_LOSS_USD");
        config.risk.max_loss_usd = val;
    }

    if let Some(val) = env_parse::<u64>("EVAL_INTERVAL_SECS") {
        info!(val, "env override: EVAL_INTERVAL_SECS");
        config.evaluation.interval_secs = val;
    }

    if let Ok(val) = std::env::var("EVAL_SYMBOLS") {
        let symbols: Vec<String> = val
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !symbols.is_empty() {
            info!(?symbols, "env override: EVAL_SYMBOLS");
            config.evaluation.symbols = symbols;
        }
    }

    if let Ok(val) = std::env::var("LOG_DIR") {
        if !val.is_empty() {
            config.logging.log_dir = val;
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
