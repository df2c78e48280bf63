pub mod parser;

pub use parser::{is_uci_move, parse_engine_event, parse_uci_message, Score, UciInfo, UciMessage};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
}
