use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stockfish not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("Engine is not running")]
    NotRunning,
    #[error("Timeout waiting for engine to respond after {0:?}")]
    HandshakeTimeout(Duration),
    #[error("Engine closed before sending uciok")]
    Closed,
}
