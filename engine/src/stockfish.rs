use crate::uci::parse_engine_event;
use crate::{EngineBackend, EngineError, EngineEvent, EngineFeeds, FEED_CAPACITY};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct StockfishConfig {
    /// Explicit executable; searched for when unset.
    pub path: Option<PathBuf>,
    pub skill_level: Option<u8>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Tag carried on this engine's log lines.
    pub label: Option<String>,
}

/// A Stockfish child process behind the [`EngineBackend`] seam.
///
/// The feeds exist from construction, so subscribers can attach before the
/// process is started and keep their subscription across restarts.
pub struct StockfishEngine {
    config: StockfishConfig,
    output_tx: broadcast::Sender<String>,
    event_tx: broadcast::Sender<EngineEvent>,
    running: Mutex<Option<RunningProcess>>,
}

struct RunningProcess {
    process: Child,
    stdin: ChildStdin,
    reader: JoinHandle<()>,
}

impl StockfishEngine {
    pub fn new(config: StockfishConfig) -> Self {
        let (output_tx, _) = broadcast::channel(FEED_CAPACITY);
        let (event_tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            config,
            output_tx,
            event_tx,
            running: Mutex::new(None),
        }
    }

    fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or("stockfish")
    }

    #[tracing::instrument(level = "info", skip(self), fields(engine = %self.label()))]
    async fn spawn_process(&self) -> Result<RunningProcess, EngineError> {
        let path = match self.config.path.clone() {
            Some(path) => path,
            None => find_stockfish_path().ok_or(EngineError::NotFound)?,
        };
        tracing::info!("Found Stockfish at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                EngineError::Spawn(e)
            })?;

        let stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        // Subscribe before the reader starts so uciok cannot slip past
        let handshake_rx = self.output_tx.subscribe();
        let reader = spawn_reader(stdout, self.output_tx.clone(), self.event_tx.clone());

        let mut running = RunningProcess {
            process,
            stdin,
            reader,
        };

        if let Err(e) = handshake(&mut running, handshake_rx).await {
            tracing::error!("Engine initialization failed: {}", e);
            running.reader.abort();
            let _ = running.process.kill().await;
            return Err(e);
        }

        if let Some(threads) = self.config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            write_line(&mut running.stdin, &format!("setoption name Threads value {}", threads))
                .await?;
        }
        if let Some(hash_mb) = self.config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            write_line(&mut running.stdin, &format!("setoption name Hash value {}", hash_mb))
                .await?;
        }
        if let Some(level) = self.config.skill_level {
            let level = level.min(20);
            tracing::info!("Setting skill level to {}", level);
            write_line(
                &mut running.stdin,
                &format!("setoption name Skill Level value {}", level),
            )
            .await?;
        }

        Ok(running)
    }
}

#[async_trait]
impl EngineBackend for StockfishEngine {
    async fn init_engine(&self) -> Result<(), EngineError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }
        *running = Some(self.spawn_process().await?);
        tracing::info!(engine = %self.label(), "Stockfish engine spawned and initialized successfully");
        Ok(())
    }

    async fn send_command(&self, command: &str) -> Result<bool, EngineError> {
        let mut running = self.running.lock().await;
        let running = running.as_mut().ok_or(EngineError::NotRunning)?;
        write_line(&mut running.stdin, command).await?;
        Ok(true)
    }

    async fn shutdown_engine(&self) -> Result<(), EngineError> {
        let Some(mut running) = self.running.lock().await.take() else {
            return Ok(());
        };

        tracing::info!(engine = %self.label(), "Sending quit command to engine");
        if let Err(e) = write_line(&mut running.stdin, "quit").await {
            tracing::warn!("Failed to send quit: {}", e);
        }
        if tokio::time::timeout(QUIT_GRACE, running.process.wait())
            .await
            .is_err()
        {
            tracing::warn!("Engine did not exit after quit, killing");
            running.process.kill().await?;
        }
        running.reader.abort();
        Ok(())
    }

    fn subscribe(&self) -> EngineFeeds {
        EngineFeeds {
            output: self.output_tx.subscribe(),
            events: self.event_tx.subscribe(),
        }
    }
}

/// Publish every stdout line on the raw feed and every parseable one on the
/// event feed until the pipe closes.
fn spawn_reader(
    stdout: tokio::process::ChildStdout,
    output_tx: broadcast::Sender<String>,
    event_tx: broadcast::Sender<EngineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::warn!("Stockfish stdout EOF - engine closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::trace!("UCI << {}", trimmed);

                    // No subscribers is not an error for a broadcast feed
                    let _ = output_tx.send(trimmed.to_string());
                    if let Some(event) = parse_engine_event(trimmed) {
                        let _ = event_tx.send(event);
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading from Stockfish stdout: {}", e);
                    break;
                }
            }
        }
        tracing::info!("Output reader task exiting");
    })
}

async fn handshake(
    running: &mut RunningProcess,
    mut output_rx: broadcast::Receiver<String>,
) -> Result<(), EngineError> {
    tracing::debug!("Sending 'uci' command");
    write_line(&mut running.stdin, "uci").await?;

    let wait = async {
        loop {
            match output_rx.recv().await {
                Ok(line) if line == "uciok" => return Ok(()),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(EngineError::Closed),
            }
        }
    };

    match tokio::time::timeout(HANDSHAKE_TIMEOUT, wait).await {
        Ok(Ok(())) => {
            tracing::debug!("Received uciok, engine ready");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(EngineError::HandshakeTimeout(HANDSHAKE_TIMEOUT)),
    }
}

async fn write_line(stdin: &mut ChildStdin, command: &str) -> Result<(), EngineError> {
    let command = command.trim_end();
    tracing::trace!("UCI >> {}", command);
    stdin.write_all(command.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

/// Find Stockfish executable in common locations
fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() || path_str == "stockfish" {
            // Try to verify it's actually runnable
            if std::process::Command::new(path_str)
                .arg("--help")
                .output()
                .is_ok()
            {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_before_init_is_rejected() {
        let engine = StockfishEngine::new(StockfishConfig::default());
        let err = engine.send_command("isready").await.unwrap_err();
        assert!(matches!(err, EngineError::NotRunning));
    }

    #[tokio::test]
    async fn test_shutdown_when_not_running_is_noop() {
        let engine = StockfishEngine::new(StockfishConfig::default());
        assert!(engine.shutdown_engine().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_binary_fails_init() {
        let engine = StockfishEngine::new(StockfishConfig {
            path: Some(PathBuf::from("/nonexistent/stockfish-binary")),
            ..Default::default()
        });
        let err = engine.init_engine().await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
    }
}
