//! Runtime configuration for the bridge.
//!
//! The actor reads the current value at the start of every scheduling and
//! flush decision; replacing it never touches a timer that is already armed.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum gap between consolidated analysis broadcasts.
pub const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 200;

/// Default minimum gap between raw message broadcasts.
pub const DEFAULT_MESSAGE_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub throttling: ThrottlingConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThrottlingConfig {
    pub analysis_interval_ms: u64,
    pub message_interval_ms: u64,
}

impl Default for ThrottlingConfig {
    fn default() -> Self {
        Self {
            analysis_interval_ms: DEFAULT_ANALYSIS_INTERVAL_MS,
            message_interval_ms: DEFAULT_MESSAGE_INTERVAL_MS,
        }
    }
}

impl ThrottlingConfig {
    pub fn analysis_interval(&self) -> Duration {
        Duration::from_millis(self.analysis_interval_ms)
    }

    pub fn message_interval(&self) -> Duration {
        Duration::from_millis(self.message_interval_ms)
    }
}

/// Per-channel emission switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventsConfig {
    pub emit_message: bool,
    pub emit_analysis: bool,
    pub emit_best_move: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            emit_message: true,
            emit_analysis: true,
            emit_best_move: true,
        }
    }
}

impl EventsConfig {
    /// Analysis updates are worth buffering while either consumer of a
    /// round (analysis or best move) is enabled.
    pub fn analysis_live(&self) -> bool {
        self.emit_analysis || self.emit_best_move
    }
}

/// Partial update for [`BridgeConfig`]. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub analysis_interval_ms: Option<u64>,
    pub message_interval_ms: Option<u64>,
    pub emit_message: Option<bool>,
    pub emit_analysis: Option<bool>,
    pub emit_best_move: Option<bool>,
}

impl BridgeConfig {
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(ms) = update.analysis_interval_ms {
            self.throttling.analysis_interval_ms = ms;
        }
        if let Some(ms) = update.message_interval_ms {
            self.throttling.message_interval_ms = ms;
        }
        if let Some(on) = update.emit_message {
            self.events.emit_message = on;
        }
        if let Some(on) = update.emit_analysis {
            self.events.emit_analysis = on;
        }
        if let Some(on) = update.emit_best_move {
            self.events.emit_best_move = on;
        }
    }
}
