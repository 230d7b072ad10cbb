use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Sizing bounds for a single book. The book pre-allocates its arenas and
/// hash indexes from these so that steady-state operation (a bounded set
/// of active prices and resting orders) performs no allocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookConfig {
    /// Upper bound on distinct price levels per side.
    pub max_levels_per_side: usize,
    /// Upper bound on simultaneously resting orders.
    pub max_open_orders: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_levels_per_side: 10_000,
            max_open_orders: 65_536,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    COMPACT,
    JSON,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<LogLevel> for LevelFilter {
    fn from(val: LogLevel) -> Self {
        match val {
            LogLevel::TRACE => LevelFilter::TRACE,
            LogLevel::DEBUG => LevelFilter::DEBUG,
            LogLevel::INFO => LevelFilter::INFO,
            LogLevel::WARN => LevelFilter::WARN,
            LogLevel::ERROR => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::INFO,
            format: LogFormat::COMPACT,
        }
    }
}

/// Top-level application configuration wrapper.
///
/// Loaded with the following precedence (lowest to highest):
/// 1) Built-in defaults
/// 2) Optional config file (if present)
/// 3) Environment variables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub book: BookConfig,
    pub logger: LogConfig,
}

impl AppConfig {
    pub fn load(config_path: &Path) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if config_path.exists() {
            figment = figment.merge(Toml::file(config_path));
        }
        figment = figment.merge(Env::prefixed("TICKBOOK_").split("__"));

        let cfg = figment.extract()?;
        Ok(cfg)
    }
}
