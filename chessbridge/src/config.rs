//! Runtime configuration for the chessbridge CLI.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;

use bridge::config::{DEFAULT_ANALYSIS_INTERVAL_MS, DEFAULT_MESSAGE_INTERVAL_MS};
use bridge::{BridgeConfig, EventsConfig, ThrottlingConfig};

/// Get the analysis throttle interval in milliseconds.
///
/// Priority:
/// 1. `CHESSBRIDGE_ANALYSIS_INTERVAL_MS` env variable if set (falls back to
///    the default if the value cannot be parsed as a `u64`)
/// 2. `200` ms as fallback
pub fn get_analysis_interval_ms() -> u64 {
    env_u64("CHESSBRIDGE_ANALYSIS_INTERVAL_MS").unwrap_or(DEFAULT_ANALYSIS_INTERVAL_MS)
}

/// Get the raw message throttle interval in milliseconds.
///
/// Priority:
/// 1. `CHESSBRIDGE_MESSAGE_INTERVAL_MS` env variable if set (falls back to
///    the default if the value cannot be parsed as a `u64`)
/// 2. `100` ms as fallback
pub fn get_message_interval_ms() -> u64 {
    env_u64("CHESSBRIDGE_MESSAGE_INTERVAL_MS").unwrap_or(DEFAULT_MESSAGE_INTERVAL_MS)
}

/// Get the Stockfish executable path, if one is configured.
///
/// Reads `CHESSBRIDGE_STOCKFISH_PATH`. When unset the engine searches the
/// usual install locations and `PATH`.
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var("CHESSBRIDGE_STOCKFISH_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Build the bridge configuration, letting explicit flags win over env.
pub fn bridge_config(
    analysis_interval_ms: Option<u64>,
    message_interval_ms: Option<u64>,
    raw: bool,
) -> BridgeConfig {
    BridgeConfig {
        throttling: ThrottlingConfig {
            analysis_interval_ms: analysis_interval_ms.unwrap_or_else(get_analysis_interval_ms),
            message_interval_ms: message_interval_ms.unwrap_or_else(get_message_interval_ms),
        },
        events: EventsConfig {
            emit_message: raw,
            ..EventsConfig::default()
        },
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_analysis_interval_ms() {
        let interval = get_analysis_interval_ms();
        match std::env::var("CHESSBRIDGE_ANALYSIS_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(val) => assert_eq!(interval, val),
            None => assert_eq!(interval, DEFAULT_ANALYSIS_INTERVAL_MS),
        }
    }

    #[test]
    fn test_flags_override_env() {
        let config = bridge_config(Some(750), Some(40), true);
        assert_eq!(config.throttling.analysis_interval_ms, 750);
        assert_eq!(config.throttling.message_interval_ms, 40);
        assert!(config.events.emit_message);
        assert!(config.events.emit_analysis);
    }

    #[test]
    fn test_raw_output_off_by_default() {
        let config = bridge_config(None, None, false);
        assert!(!config.events.emit_message);
        assert!(config.events.emit_best_move);
    }

    #[test]
    fn test_env_u64_missing_key() {
        assert_eq!(env_u64("CHESSBRIDGE_TEST_UNSET_KEY_FOR_TESTS"), None);
    }
}
