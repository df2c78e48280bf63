use engine::EngineFeeds;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::Instrument;

use crate::commands::BridgeCommand;
use crate::state::BridgeState;

/// The bridge actor loop.
/// Owns all mutable state. Processes commands, engine feeds and throttle
/// deadlines sequentially, so no buffer or timer is ever shared.
pub(crate) async fn run_bridge_actor(
    state: BridgeState,
    cmd_rx: mpsc::Receiver<BridgeCommand>,
    feeds: EngineFeeds,
) {
    run_bridge_actor_inner(state, cmd_rx, feeds)
        .instrument(tracing::info_span!("bridge"))
        .await;
}

async fn run_bridge_actor_inner(
    mut state: BridgeState,
    mut cmd_rx: mpsc::Receiver<BridgeCommand>,
    feeds: EngineFeeds,
) {
    tracing::info!("Bridge actor started");

    let mut output_rx = Some(feeds.output);
    let mut event_rx = Some(feeds.events);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(BridgeCommand::Destroy { reply }) => {
                        tracing::info!("Bridge destroyed");
                        state.destroy().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        tracing::info!("All bridge handles dropped, shutting down");
                        state.destroy().await;
                        break;
                    }
                    Some(cmd) => handle_command(&mut state, cmd).await,
                }
            }

            Some(event) = next_from(&mut event_rx) => {
                state.ingest_event(event);
            }

            _ = fire_at(state.analysis.deadline()) => {
                state.flush_analysis();
            }

            _ = fire_at(state.messages.deadline()) => {
                state.flush_messages();
            }

            // Raw output is the busiest feed; polled last so it cannot
            // starve the deadlines
            Some(line) = next_from(&mut output_rx) => {
                state.ingest_output(line);
            }
        }
    }

    // Dropping the receivers releases both upstream subscriptions
    drop(output_rx);
    drop(event_rx);
    tracing::info!("Bridge actor exited");
}

async fn handle_command(state: &mut BridgeState, cmd: BridgeCommand) {
    match cmd {
        BridgeCommand::Init { reply } => {
            let ok = state.gateway.init().await.is_ok();
            let _ = reply.send(ok);
        }
        BridgeCommand::SendCommand { command, reply } => {
            let ok = state.send_command(&command).await.is_ok();
            let _ = reply.send(ok);
        }
        BridgeCommand::Shutdown { reply } => {
            let ok = state.shutdown().await.is_ok();
            let _ = reply.send(ok);
        }
        BridgeCommand::SetConfig { update, reply } => {
            let _ = reply.send(state.set_config(update));
        }
        BridgeCommand::GetConfig { reply } => {
            let _ = reply.send(state.config.clone());
        }
        BridgeCommand::LastBestMove { reply } => {
            let _ = reply.send(state.last_best_move.clone());
        }
        BridgeCommand::AddMessageListener { listener, reply } => {
            let _ = reply.send(state.subscribers.message.add(listener));
        }
        BridgeCommand::AddAnalysisListener { listener, reply } => {
            let _ = reply.send(state.subscribers.analysis.add(listener));
        }
        BridgeCommand::AddBestMoveListener { listener, reply } => {
            let _ = reply.send(state.subscribers.best_move.add(listener));
        }
        BridgeCommand::RemoveListener { channel, id, reply } => {
            let removed = state.subscribers.remove(channel, id);
            if !removed {
                tracing::debug!(?channel, %id, "Listener not registered");
            }
            let _ = reply.send(removed);
        }
        BridgeCommand::ListenerCount { channel, reply } => {
            let _ = reply.send(state.subscribers.count(channel));
        }
        BridgeCommand::Destroy { .. } => unreachable!(),
    }
}

/// Next value from an upstream feed. A closed feed is dropped and never
/// polled again; lagging only costs the skipped values.
async fn next_from<T: Clone>(feed: &mut Option<broadcast::Receiver<T>>) -> Option<T> {
    let Some(rx) = feed.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(value) => return Some(value),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Bridge fell behind engine feed");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::warn!("Engine feed closed");
                *feed = None;
                return None;
            }
        }
    }
}

/// Resolves at `deadline`, or never when no timer is armed.
async fn fire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
