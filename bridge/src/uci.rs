//! Command sequences for the convenience helpers on [`crate::Bridge`].

use serde::{Deserialize, Serialize};

pub const DEFAULT_ANALYSIS_DEPTH: u32 = 20;
pub const DEFAULT_MULTI_PV: u32 = 1;
pub const DEFAULT_MOVE_TIME_MS: u64 = 1000;
pub const DEFAULT_MOVE_DEPTH: u32 = 15;

/// Search limits for [`analysis_commands`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub depth: u32,
    pub multi_pv: u32,
    pub movetime: Option<u64>,
    pub nodes: Option<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_ANALYSIS_DEPTH,
            multi_pv: DEFAULT_MULTI_PV,
            movetime: None,
            nodes: None,
        }
    }
}

/// Full handshake, fresh game, position, then a bounded multi-PV search.
pub fn analysis_commands(fen: &str, options: &AnalysisOptions) -> Vec<String> {
    let mut go = format!("go depth {} multipv {}", options.depth, options.multi_pv);
    if let Some(movetime) = options.movetime.filter(|&ms| ms > 0) {
        go.push_str(&format!(" movetime {}", movetime));
    }
    if let Some(nodes) = options.nodes.filter(|&n| n > 0) {
        go.push_str(&format!(" nodes {}", nodes));
    }

    vec![
        "uci".to_string(),
        "isready".to_string(),
        "ucinewgame".to_string(),
        format!("position fen {}", fen),
        go,
    ]
}

/// Handshake, position, then a time- and depth-bounded search for one move.
pub fn computer_move_commands(fen: &str, movetime_ms: u64, depth: u32) -> Vec<String> {
    vec![
        "uci".to_string(),
        "isready".to_string(),
        format!("position fen {}", fen),
        format!("go movetime {} depth {}", movetime_ms, depth),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_analysis_defaults() {
        let cmds = analysis_commands(START, &AnalysisOptions::default());
        assert_eq!(
            cmds,
            vec![
                "uci".to_string(),
                "isready".to_string(),
                "ucinewgame".to_string(),
                format!("position fen {}", START),
                "go depth 20 multipv 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_analysis_optional_limits() {
        let options = AnalysisOptions {
            depth: 18,
            multi_pv: 3,
            movetime: Some(2500),
            nodes: Some(1_000_000),
        };
        let cmds = analysis_commands(START, &options);
        assert_eq!(
            cmds.last().unwrap(),
            "go depth 18 multipv 3 movetime 2500 nodes 1000000"
        );
    }

    #[test]
    fn test_zero_limits_are_omitted() {
        let options = AnalysisOptions {
            movetime: Some(0),
            nodes: Some(0),
            ..Default::default()
        };
        let cmds = analysis_commands(START, &options);
        assert_eq!(cmds.last().unwrap(), "go depth 20 multipv 1");
    }

    #[test]
    fn test_computer_move_sequence() {
        let cmds = computer_move_commands(START, DEFAULT_MOVE_TIME_MS, DEFAULT_MOVE_DEPTH);
        assert_eq!(cmds.len(), 4);
        assert!(!cmds.iter().any(|c| c == "ucinewgame"));
        assert_eq!(cmds[3], "go movetime 1000 depth 15");
    }
}
