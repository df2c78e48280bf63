//! Engine collaborator for the analysis bridge.
//!
//! Owns everything on the far side of the bridge: the [`EngineBackend`] seam,
//! the parsed event model, the UCI line parser and a process-backed
//! [`StockfishEngine`]. The bridge core only ever talks to `EngineBackend`.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stockfish;
pub mod uci;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub use error::EngineError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockEngine};
pub use stockfish::{StockfishConfig, StockfishEngine};
pub use uci::{parse_engine_event, parse_uci_message, UciError, UciMessage};

/// Capacity of the raw-line and parsed-event broadcast feeds.
pub const FEED_CAPACITY: usize = 256;

/// One analysis update for a single principal variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    /// 1-based principal-variation index.
    #[serde(default = "default_multipv")]
    pub multipv: u32,
    pub depth: Option<u32>,
    /// Evaluation in centipawns from the side to move.
    pub score: Option<i32>,
    /// Mate in N (negative when being mated).
    pub mate: Option<i32>,
    pub best_move: Option<String>,
    pub pv: Option<Vec<String>>,
}

fn default_multipv() -> u32 {
    1
}

impl Default for EngineInfo {
    fn default() -> Self {
        Self {
            multipv: default_multipv(),
            depth: None,
            score: None,
            mate: None,
            best_move: None,
            pv: None,
        }
    }
}

/// Terminal result of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMove {
    #[serde(rename = "move")]
    pub mv: String,
    pub ponder: Option<String>,
}

/// Parsed events published by the engine collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineEvent {
    Info(EngineInfo),
    BestMove(BestMove),
}

/// The two inbound feeds a backend publishes. Dropping a receiver releases
/// that subscription.
#[derive(Debug)]
pub struct EngineFeeds {
    pub output: broadcast::Receiver<String>,
    pub events: broadcast::Receiver<EngineEvent>,
}

/// Surface of an engine process as seen by the bridge.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    /// Start the engine. Calling this on a running engine succeeds immediately.
    async fn init_engine(&self) -> Result<(), EngineError>;

    /// Forward one command line. `Ok(false)` means the engine declined it.
    async fn send_command(&self, command: &str) -> Result<bool, EngineError>;

    /// Stop the engine. Calling this on a stopped engine succeeds immediately.
    async fn shutdown_engine(&self) -> Result<(), EngineError>;

    /// Open a fresh pair of event subscriptions.
    fn subscribe(&self) -> EngineFeeds;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_defaults_to_first_pv() {
        assert_eq!(EngineInfo::default().multipv, 1);

        let info: EngineInfo = serde_json::from_str(r#"{"depth": 7}"#).unwrap();
        assert_eq!(info.multipv, 1);
        assert_eq!(info.depth, Some(7));
    }

    #[test]
    fn test_info_json_matches_analysis_casing() {
        let info = EngineInfo {
            best_move: Some("g1f3".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(EngineEvent::Info(info)).unwrap();
        assert_eq!(json["type"], "info");
        assert_eq!(json["bestMove"], "g1f3");
        assert!(json.get("best_move").is_none());
    }

    #[test]
    fn test_event_json_shape() {
        let event = EngineEvent::BestMove(BestMove {
            mv: "e2e4".to_string(),
            ponder: Some("e7e5".to_string()),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "bestmove");
        assert_eq!(json["move"], "e2e4");
        assert_eq!(json["ponder"], "e7e5");
    }
}
