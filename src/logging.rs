//! Logging setup
//!
//! The library itself only talks to the `log` facade. Hosts call [`init`] once
//! at startup to route records through `env_logger`; `RUST_LOG` still wins
//! over the configured level.

use crate::config::LogConfig;
use log::LevelFilter;

/// Resolve the default filter from configuration and the debug override
pub fn default_filter(config: &LogConfig, debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }
    match parse_level(&config.level) {
        Some(level) => level.to_string().to_lowercase(),
        None => "info".to_string(),
    }
}

/// Parse a level name, ignoring case and surrounding whitespace
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Install `env_logger` as the global logger
///
/// Returns `false` if a logger was already installed (e.g. by another test).
pub fn init(config: &LogConfig, debug: bool) -> bool {
    let filter = default_filter(config, debug);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
