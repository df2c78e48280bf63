use engine::BestMove;
use tokio::sync::oneshot;

use crate::aggregation::ConsolidatedAnalysis;
use crate::config::{BridgeConfig, ConfigUpdate};
use crate::registry::{Channel, Listener, ListenerId};

/// Commands sent to the bridge actor. Each embeds a oneshot for the reply.
pub(crate) enum BridgeCommand {
    Init {
        reply: oneshot::Sender<bool>,
    },
    SendCommand {
        command: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<bool>,
    },
    SetConfig {
        update: ConfigUpdate,
        reply: oneshot::Sender<BridgeConfig>,
    },
    GetConfig {
        reply: oneshot::Sender<BridgeConfig>,
    },
    LastBestMove {
        reply: oneshot::Sender<Option<BestMove>>,
    },
    AddMessageListener {
        listener: Listener<String>,
        reply: oneshot::Sender<ListenerId>,
    },
    AddAnalysisListener {
        listener: Listener<ConsolidatedAnalysis>,
        reply: oneshot::Sender<ListenerId>,
    },
    AddBestMoveListener {
        listener: Listener<BestMove>,
        reply: oneshot::Sender<ListenerId>,
    },
    RemoveListener {
        channel: Channel,
        id: ListenerId,
        reply: oneshot::Sender<bool>,
    },
    ListenerCount {
        channel: Channel,
        reply: oneshot::Sender<usize>,
    },
    Destroy {
        reply: oneshot::Sender<()>,
    },
}
