//! Application configuration.

use crate::error::{AppError, AppResult};
use quoter_mm::StrategyParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Host runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Heartbeat timer interval (ms). Default: 1,000.
    #[serde(default = "default_timer_interval_ms")]
    pub timer_interval_ms: u64,
    /// Log filter override (falls back to `RUST_LOG`).
    #[serde(default)]
    pub log_level: Option<String>,
    /// Print Prometheus metrics on shutdown.
    #[serde(default)]
    pub dump_metrics: bool,
}

fn default_timer_interval_ms() -> u64 {
    1_000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer_interval_ms: default_timer_interval_ms(),
            log_level: None,
            dump_metrics: false,
        }
    }
}

/// Traded instrument, identified by its composed name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Data source (e.g. "DEFAULT").
    pub source: String,
    /// Exchange segment (e.g. "NSEFO").
    pub exchange: String,
    pub symbol: String,
    /// Expiry as YYYYMMDD; empty for cash instruments.
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub strike: String,
    /// "C" or "P"; empty for non-options.
    #[serde(default)]
    pub option_type: String,
}

impl InstrumentConfig {
    /// `SOURCE EXCHANGE SYMBOL [EXPIRY] [STRIKE] [OPT]`, empty parts omitted.
    pub fn composed_name(&self) -> String {
        let mut name = format!("{} {} {}", self.source, self.exchange, self.symbol);
        for part in [&self.expiry, &self.strike, &self.option_type] {
            if !part.is_empty() {
                name.push(' ');
                name.push_str(part);
            }
        }
        name
    }
}

/// One entry of the instrument table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub name: String,
    pub contract_id: i64,
    #[serde(default = "default_lot_size")]
    pub lot_size: i64,
}

fn default_lot_size() -> i64 {
    1
}

/// Paper venue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// JSON-lines book file to replay.
    pub replay_file: PathBuf,
    /// Delay between replayed books (ms). Default: 0.
    #[serde(default)]
    pub replay_interval_ms: u64,
    /// Pre-trade check: largest order quantity accepted. None = unlimited.
    #[serde(default)]
    pub max_order_qty: Option<i64>,
    /// Known instruments.
    #[serde(default)]
    pub instruments: Vec<InstrumentEntry>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: RuntimeConfig,
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub strategy: StrategyParams,
    pub paper: PaperConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
