use std::sync::Arc;

use engine::{BestMove, EngineBackend, EngineEvent, EngineInfo};
use tokio::time::Instant;

use crate::config::{BridgeConfig, ConfigUpdate};
use crate::error::BridgeError;
use crate::gateway::CommandGateway;
use crate::registry::Subscribers;
use crate::throttle::{AnalysisThrottle, MessageThrottle};

/// Everything the bridge actor owns. Only the actor task touches it.
pub(crate) struct BridgeState {
    pub gateway: CommandGateway,
    pub config: BridgeConfig,
    pub messages: MessageThrottle,
    pub analysis: AnalysisThrottle,
    pub subscribers: Subscribers,
    pub last_best_move: Option<BestMove>,
}

impl BridgeState {
    pub fn new(backend: Arc<dyn EngineBackend>, config: BridgeConfig) -> Self {
        Self {
            gateway: CommandGateway::new(backend),
            config,
            messages: MessageThrottle::default(),
            analysis: AnalysisThrottle::default(),
            subscribers: Subscribers::default(),
            last_best_move: None,
        }
    }

    pub fn ingest_output(&mut self, line: String) {
        tracing::trace!("Raw << {}", line);
        self.messages.ingest(line, &self.config, Instant::now());
    }

    pub fn ingest_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Info(info) => self.ingest_info(info),
            EngineEvent::BestMove(best) => self.on_best_move(best),
        }
    }

    fn ingest_info(&mut self, info: EngineInfo) {
        tracing::trace!(multipv = info.multipv, depth = ?info.depth, "Analysis update");
        self.analysis.ingest(info, &self.config, Instant::now());
    }

    /// A best move closes the analysis round and is delivered unthrottled.
    fn on_best_move(&mut self, best: BestMove) {
        tracing::debug!(mv = %best.mv, ponder = ?best.ponder, "Best move");
        if self.config.events.emit_best_move {
            self.subscribers.best_move.notify(&best);
        }
        self.last_best_move = Some(best);

        let dropped = self.analysis.close_round();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded buffered analysis on best move");
        }
    }

    pub fn flush_messages(&mut self) {
        if let Some(line) = self.messages.flush(&self.config, Instant::now()) {
            self.subscribers.message.notify(&line);
        }
    }

    pub fn flush_analysis(&mut self) {
        let snapshot = self
            .analysis
            .flush(&self.config, Instant::now(), self.gateway.fen());
        if let Some(snapshot) = snapshot {
            tracing::debug!(
                pvs = snapshot.depths.len().max(snapshot.best_moves.len()),
                listeners = self.subscribers.analysis.len(),
                "Flushing consolidated analysis"
            );
            self.subscribers.analysis.notify(&snapshot);
        }
    }

    pub fn set_config(&mut self, update: ConfigUpdate) -> BridgeConfig {
        self.config.apply(update);
        tracing::info!(config = ?self.config, "Configuration updated");
        self.config.clone()
    }

    pub async fn send_command(&mut self, command: &str) -> Result<(), BridgeError> {
        self.gateway.send_command(command).await
    }

    pub async fn shutdown(&mut self) -> Result<(), BridgeError> {
        if self.gateway.is_initialized() {
            // Output buffered from the stopped engine is never flushed
            self.messages.reset();
            self.analysis.close_round();
        }
        self.gateway.shutdown().await
    }

    /// Tear everything down. Shutdown failure is logged and ignored.
    pub async fn destroy(&mut self) {
        self.messages.reset();
        self.analysis.close_round();
        if let Err(e) = self.shutdown().await {
            tracing::warn!("Shutdown during destroy failed: {}", e);
        }
        self.subscribers.clear();
    }
}
