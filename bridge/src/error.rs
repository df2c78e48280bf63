use engine::EngineError;

/// Failures inside the bridge. None of these escape the public surface,
/// which logs them and reports `false`.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Engine initialization failed: {0}")]
    InitializationFailure(#[source] EngineError),
    #[error("Command rejected: {command}")]
    CommandRejected {
        command: String,
        #[source]
        source: Option<EngineError>,
    },
    #[error("Engine shutdown failed: {0}")]
    ShutdownFailure(#[source] EngineError),
    #[error("Bridge has been destroyed")]
    Closed,
}
