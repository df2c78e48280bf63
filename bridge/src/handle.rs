use std::sync::Arc;

use engine::{BestMove, EngineBackend};
use tokio::sync::{mpsc, oneshot};

use crate::actor::run_bridge_actor;
use crate::aggregation::ConsolidatedAnalysis;
use crate::commands::BridgeCommand;
use crate::config::{BridgeConfig, ConfigUpdate};
use crate::error::BridgeError;
use crate::registry::{Channel, ListenerId};
use crate::state::BridgeState;
use crate::uci::{analysis_commands, computer_move_commands, AnalysisOptions};

/// Cheap, cloneable handle to a bridge actor.
///
/// Every operation degrades to `false`/`None` instead of returning an error;
/// failures are logged where they happen.
#[derive(Clone)]
pub struct Bridge {
    cmd_tx: mpsc::Sender<BridgeCommand>,
}

/// Registration returned by the `add_*_listener` methods.
///
/// Holds only a weak reference to the bridge, so an outstanding subscription
/// never keeps the actor alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    channel: Channel,
    id: ListenerId,
    cmd_tx: mpsc::WeakSender<BridgeCommand>,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener. Returns whether it was still registered.
    pub async fn unsubscribe(self) -> bool {
        match self.cmd_tx.upgrade() {
            Some(cmd_tx) => Bridge { cmd_tx }.remove_listener(self.channel, self.id).await,
            None => false,
        }
    }
}

impl Bridge {
    /// Subscribe to the backend's feeds and spawn the actor.
    /// Must be called inside a tokio runtime.
    pub fn new(backend: Arc<dyn EngineBackend>, config: BridgeConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let feeds = backend.subscribe();
        let state = BridgeState::new(backend, config);
        tokio::spawn(run_bridge_actor(state, cmd_rx, feeds));
        Self { cmd_tx }
    }

    pub async fn init(&self) -> bool {
        self.request(|reply| BridgeCommand::Init { reply })
            .await
            .unwrap_or_else(|e| closed("init", e, false))
    }

    pub async fn send_command(&self, command: impl Into<String>) -> bool {
        let command = command.into();
        self.request(|reply| BridgeCommand::SendCommand { command, reply })
            .await
            .unwrap_or_else(|e| closed("send_command", e, false))
    }

    pub async fn shutdown(&self) -> bool {
        self.request(|reply| BridgeCommand::Shutdown { reply })
            .await
            .unwrap_or_else(|e| closed("shutdown", e, false))
    }

    /// Stop the engine, drop every listener and end the actor. The bridge
    /// cannot be used afterwards.
    pub async fn destroy(&self) {
        if let Err(e) = self.request(|reply| BridgeCommand::Destroy { reply }).await {
            closed("destroy", e, ());
        }
    }

    /// Apply a partial update and return the resulting configuration.
    /// Timers that are already armed keep their deadline.
    pub async fn set_config(&self, update: ConfigUpdate) -> Option<BridgeConfig> {
        self.request(|reply| BridgeCommand::SetConfig { update, reply })
            .await
            .map_err(|e| closed("set_config", e, ()))
            .ok()
    }

    pub async fn config(&self) -> Option<BridgeConfig> {
        self.request(|reply| BridgeCommand::GetConfig { reply })
            .await
            .ok()
    }

    pub async fn last_best_move(&self) -> Option<BestMove> {
        self.request(|reply| BridgeCommand::LastBestMove { reply })
            .await
            .ok()
            .flatten()
    }

    pub async fn add_message_listener<F>(&self, listener: F) -> Option<Subscription>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let listener = Arc::new(move |line: &String| listener(line.as_str()));
        let id = self
            .request(|reply| BridgeCommand::AddMessageListener { listener, reply })
            .await
            .ok()?;
        Some(self.subscription(Channel::Message, id))
    }

    pub async fn add_analysis_listener<F>(&self, listener: F) -> Option<Subscription>
    where
        F: Fn(&ConsolidatedAnalysis) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        let id = self
            .request(|reply| BridgeCommand::AddAnalysisListener { listener, reply })
            .await
            .ok()?;
        Some(self.subscription(Channel::Analysis, id))
    }

    pub async fn add_best_move_listener<F>(&self, listener: F) -> Option<Subscription>
    where
        F: Fn(&BestMove) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        let id = self
            .request(|reply| BridgeCommand::AddBestMoveListener { listener, reply })
            .await
            .ok()?;
        Some(self.subscription(Channel::BestMove, id))
    }

    pub async fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.remove_listener(Channel::Message, id).await
    }

    pub async fn remove_analysis_listener(&self, id: ListenerId) -> bool {
        self.remove_listener(Channel::Analysis, id).await
    }

    pub async fn remove_best_move_listener(&self, id: ListenerId) -> bool {
        self.remove_listener(Channel::BestMove, id).await
    }

    pub async fn listener_count(&self, channel: Channel) -> usize {
        self.request(|reply| BridgeCommand::ListenerCount { channel, reply })
            .await
            .unwrap_or(0)
    }

    /// `uci`, `isready`, `ucinewgame`, `position fen`, then `go`.
    /// Stops at the first command the engine does not accept.
    pub async fn analyze_position(&self, fen: &str, options: &AnalysisOptions) -> bool {
        self.send_all(analysis_commands(fen, options)).await
    }

    /// `uci`, `isready`, `position fen`, then `go movetime .. depth ..`.
    pub async fn get_computer_move(&self, fen: &str, movetime_ms: u64, depth: u32) -> bool {
        self.send_all(computer_move_commands(fen, movetime_ms, depth))
            .await
    }

    pub async fn stop_analysis(&self) -> bool {
        self.send_command("stop").await
    }

    async fn send_all(&self, commands: Vec<String>) -> bool {
        for command in commands {
            if !self.send_command(command).await {
                return false;
            }
        }
        true
    }

    async fn remove_listener(&self, channel: Channel, id: ListenerId) -> bool {
        self.request(|reply| BridgeCommand::RemoveListener { channel, id, reply })
            .await
            .unwrap_or(false)
    }

    fn subscription(&self, channel: Channel, id: ListenerId) -> Subscription {
        Subscription {
            channel,
            id,
            cmd_tx: self.cmd_tx.downgrade(),
        }
    }

    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> BridgeCommand,
    ) -> Result<R, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| BridgeError::Closed)?;
        rx.await.map_err(|_| BridgeError::Closed)
    }
}

fn closed<T>(op: &str, err: BridgeError, fallback: T) -> T {
    tracing::debug!("{} on closed bridge: {}", op, err);
    fallback
}
