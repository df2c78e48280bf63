//! Event aggregation and throttling between a UCI engine and its consumers.
//!
//! The engine publishes a firehose: every stdout line, plus one parsed
//! update per search depth per principal variation. [`Bridge`] turns that
//! into three bounded-rate channels:
//!
//! - **message**: at most one raw line per `message_interval_ms`, always the
//!   latest one seen.
//! - **analysis**: at most one [`ConsolidatedAnalysis`] per
//!   `analysis_interval_ms`, merging the latest update for each PV.
//! - **best move**: delivered immediately. A best move also ends the current
//!   analysis round, discarding anything still buffered for it.
//!
//! All state lives in one actor task; [`Bridge`] is a cloneable handle.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bridge::{AnalysisOptions, Bridge, BridgeConfig};
//! use engine::{StockfishConfig, StockfishEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Arc::new(StockfishEngine::new(StockfishConfig::default()));
//!     let bridge = Bridge::new(engine, BridgeConfig::default());
//!
//!     bridge
//!         .add_analysis_listener(|a| println!("{:?}", a.evaluations))
//!         .await;
//!     bridge
//!         .analyze_position(
//!             "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
//!             &AnalysisOptions::default(),
//!         )
//!         .await;
//! }
//! ```

mod actor;
pub mod aggregation;
mod commands;
pub mod config;
pub mod error;
pub mod gateway;
mod handle;
pub mod registry;
mod state;
pub mod throttle;
pub mod uci;

pub use aggregation::{AggregationBuffer, ConsolidatedAnalysis};
pub use config::{BridgeConfig, ConfigUpdate, EventsConfig, ThrottlingConfig};
pub use error::BridgeError;
pub use handle::{Bridge, Subscription};
pub use registry::{Channel, ListenerId};
pub use uci::AnalysisOptions;
