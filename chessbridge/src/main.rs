//! chessbridge - throttled UCI engine analysis from the command line.
//!
//! Spawns a Stockfish process behind the bridge and prints what the bridge's
//! subscribers see:
//!
//! - **`analyze`**: one JSON line per consolidated analysis flush, then the
//!   best move once the search ends.
//! - **`move`**: only the move the engine chooses.
//!
//! Ctrl-C stops the running search and tears the engine down. Throttle
//! intervals and the engine path can also be set through the environment
//! (see [`config`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bridge::{AnalysisOptions, Bridge};
use clap::{Parser, Subcommand};
use engine::{BestMove, EngineEvent, StockfishConfig, StockfishEngine};
use tokio::sync::mpsc;

mod config;

/// How long to wait for `bestmove` after sending `stop`.
const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "chessbridge", about = "Rate-limited UCI engine analysis")]
struct Cli {
    /// Engine executable. Falls back to CHESSBRIDGE_STOCKFISH_PATH, then a search.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Engine search threads.
    #[arg(long, global = true)]
    threads: Option<u32>,

    /// Engine hash size in MB.
    #[arg(long, global = true)]
    hash: Option<u32>,

    /// Minimum milliseconds between analysis updates.
    #[arg(long, global = true)]
    analysis_interval_ms: Option<u64>,

    /// Minimum milliseconds between raw engine lines (with --raw).
    #[arg(long, global = true)]
    message_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a position and stream consolidated multi-PV updates.
    Analyze {
        /// Position in FEN.
        #[arg(long)]
        fen: String,

        #[arg(long, default_value_t = bridge::uci::DEFAULT_ANALYSIS_DEPTH)]
        depth: u32,

        /// Number of principal variations to search.
        #[arg(long, default_value_t = bridge::uci::DEFAULT_MULTI_PV)]
        multipv: u32,

        #[arg(long)]
        movetime: Option<u64>,

        #[arg(long)]
        nodes: Option<u64>,

        /// Also print throttled raw engine output to stderr.
        #[arg(long)]
        raw: bool,
    },
    /// Ask the engine for a single move.
    Move {
        /// Position in FEN.
        #[arg(long)]
        fen: String,

        /// Search time in milliseconds.
        #[arg(long, default_value_t = bridge::uci::DEFAULT_MOVE_TIME_MS)]
        movetime: u64,

        #[arg(long, default_value_t = bridge::uci::DEFAULT_MOVE_DEPTH)]
        depth: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = matches!(cli.command, Commands::Analyze { raw: true, .. });
    let bridge_config = config::bridge_config(cli.analysis_interval_ms, cli.message_interval_ms, raw);
    let engine = StockfishEngine::new(StockfishConfig {
        path: cli.engine.or_else(config::get_stockfish_path),
        threads: cli.threads,
        hash_mb: cli.hash,
        skill_level: None,
        label: Some("chessbridge".to_string()),
    });
    let bridge = Bridge::new(Arc::new(engine), bridge_config);

    let result = run(&bridge, cli.command).await;
    bridge.destroy().await;
    result
}

async fn run(bridge: &Bridge, command: Commands) -> anyhow::Result<()> {
    let (best_tx, mut best_rx) = mpsc::unbounded_channel::<BestMove>();
    bridge
        .add_best_move_listener(move |best| {
            let _ = best_tx.send(best.clone());
        })
        .await
        .context("bridge closed before listeners were attached")?;

    if !bridge.init().await {
        bail!("failed to start the engine (is Stockfish installed? try --engine)");
    }

    let (started, print_json) = match command {
        Commands::Analyze {
            fen,
            depth,
            multipv,
            movetime,
            nodes,
            raw,
        } => {
            bridge
                .add_analysis_listener(|analysis| match serde_json::to_string(analysis) {
                    Ok(json) => println!("{}", json),
                    Err(e) => tracing::warn!("Failed to encode analysis: {}", e),
                })
                .await
                .context("bridge closed before listeners were attached")?;
            if raw {
                bridge
                    .add_message_listener(|line| eprintln!("<< {}", line))
                    .await
                    .context("bridge closed before listeners were attached")?;
            }

            let options = AnalysisOptions {
                depth,
                multi_pv: multipv,
                movetime,
                nodes,
            };
            (bridge.analyze_position(&fen, &options).await, true)
        }
        Commands::Move {
            fen,
            movetime,
            depth,
        } => (bridge.get_computer_move(&fen, movetime, depth).await, false),
    };

    if !started {
        bail!("engine rejected the search commands");
    }

    let best = tokio::select! {
        best = best_rx.recv() => best,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping search");
            bridge.stop_analysis().await;
            tokio::time::timeout(STOP_GRACE, best_rx.recv()).await.ok().flatten()
        }
    };

    let Some(best) = best else {
        bail!("search ended without a best move");
    };

    if print_json {
        println!("{}", serde_json::to_string(&EngineEvent::BestMove(best))?);
    } else {
        match best.ponder {
            Some(ponder) => println!("{} (ponder {})", best.mv, ponder),
            None => println!("{}", best.mv),
        }
    }
    Ok(())
}
