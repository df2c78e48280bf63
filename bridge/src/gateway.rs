//! Command gateway: stateless forwarding to the engine with lazy start-up.

use std::sync::Arc;

use engine::EngineBackend;

use crate::error::BridgeError;

pub struct CommandGateway {
    backend: Arc<dyn EngineBackend>,
    initialized: bool,
    fen: Option<String>,
}

impl CommandGateway {
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            backend,
            initialized: false,
            fen: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// FEN of the last `position fen` command the engine accepted.
    pub fn fen(&self) -> Option<&str> {
        self.fen.as_deref()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn init(&mut self) -> Result<(), BridgeError> {
        if self.initialized {
            return Ok(());
        }
        self.backend.init_engine().await.map_err(|e| {
            tracing::error!("Failed to initialize engine: {}", e);
            BridgeError::InitializationFailure(e)
        })?;
        self.initialized = true;
        tracing::info!("Engine initialized");
        Ok(())
    }

    /// Forward one command, starting the engine first if needed.
    ///
    /// A failed start does not stop the command: the backend still sees it
    /// and its answer decides the result.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn send_command(&mut self, command: &str) -> Result<(), BridgeError> {
        if !self.initialized {
            // Already logged by init
            let _ = self.init().await;
        }

        match self.backend.send_command(command).await {
            Ok(true) => {
                if command.trim_start().starts_with("position") {
                    self.fen = position_fen(command).map(str::to_string);
                }
                Ok(())
            }
            Ok(false) => {
                tracing::warn!("Engine declined command: {}", command);
                Err(BridgeError::CommandRejected {
                    command: command.to_string(),
                    source: None,
                })
            }
            Err(e) => {
                tracing::error!("Failed to send command to engine: {}", e);
                Err(BridgeError::CommandRejected {
                    command: command.to_string(),
                    source: Some(e),
                })
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn shutdown(&mut self) -> Result<(), BridgeError> {
        if !self.initialized {
            return Ok(());
        }
        self.backend.shutdown_engine().await.map_err(|e| {
            tracing::error!("Failed to shutdown engine: {}", e);
            BridgeError::ShutdownFailure(e)
        })?;
        self.initialized = false;
        tracing::info!("Engine shut down");
        Ok(())
    }
}

/// The FEN a `position fen <fen>` command leaves on the board. Moves played
/// on top of it, or a `startpos` base, leave no FEN to report.
fn position_fen(command: &str) -> Option<&str> {
    let rest = command.trim().strip_prefix("position fen ")?;
    match rest.split_once(" moves") {
        Some((_, moves)) if !moves.trim().is_empty() => None,
        Some((fen, _)) => Some(fen.trim()),
        None => Some(rest.trim()),
    }
}
