use crate::{BestMove, EngineEvent, EngineInfo};

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    BestMove { mv: String, ponder: Option<String> },
    Info(UciInfo),
}

/// Everything an `info` line can carry that we understand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UciInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<String>, // Principal variation
    pub multipv: Option<u32>,
    pub currmove: Option<String>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let Some(&mv) = tokens.get(1) else {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            };
            // Passed through as-is: engines also report "(none)" and the null move "0000"
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(&p)) if is_uci_move(p) => Some(p.to_string()),
                _ => None,
            };
            Ok(UciMessage::BestMove {
                mv: mv.to_string(),
                ponder,
            })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse a raw engine line into the event the bridge consumes.
///
/// `info` lines only become events when they carry both a score and a pv;
/// progress lines (currmove, hashfull, strings) are left to the raw feed.
pub fn parse_engine_event(line: &str) -> Option<EngineEvent> {
    match parse_uci_message(line).ok()? {
        UciMessage::BestMove { mv, ponder } => Some(EngineEvent::BestMove(BestMove { mv, ponder })),
        UciMessage::Info(info) => {
            if info.score.is_none() || info.pv.is_empty() {
                return None;
            }
            let (score, mate) = match info.score {
                Some(Score::Centipawns(cp)) => (Some(cp), None),
                Some(Score::Mate(m)) => (None, Some(m)),
                None => (None, None),
            };
            Some(EngineEvent::Info(EngineInfo {
                multipv: info.multipv.unwrap_or(1),
                depth: info.depth,
                score,
                mate,
                best_move: info.pv.first().cloned(),
                pv: Some(info.pv),
            }))
        }
        _ => None,
    }
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str]) -> UciInfo {
    let mut info = UciInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                    // Bound markers trail the value
                    if matches!(tokens.get(i + 1), Some(&"lowerbound") | Some(&"upperbound")) {
                        i += 1;
                    }
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if is_uci_move(tokens[i]) {
                        info.pv.push(tokens[i].to_string());
                    }
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "currmove" => {
                i += 1;
                info.currmove = tokens
                    .get(i)
                    .filter(|s| is_uci_move(s))
                    .map(|s| s.to_string());
            }
            "hashfull" => {
                i += 1;
                info.hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "string" => {
                // Free text runs to end of line
                break;
            }
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Check long algebraic move syntax (e2e4, e7e8q). Says nothing about legality.
pub fn is_uci_move(s: &str) -> bool {
    let b = s.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbnk".contains(&b[4]),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { mv, ponder } => {
                assert_eq!(mv, "e2e4");
                assert_eq!(ponder.as_deref(), Some("e7e5"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert_eq!(
            msg,
            UciMessage::BestMove {
                mv: "(none)".to_string(),
                ponder: None
            }
        );
        assert!(parse_uci_message("bestmove").is_err());
    }

    #[test]
    fn test_null_bestmove_still_ends_search() {
        let event = parse_engine_event("bestmove 0000").unwrap();
        assert_eq!(
            event,
            EngineEvent::BestMove(BestMove {
                mv: "0000".to_string(),
                ponder: None
            })
        );
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score, Some(Score::Centipawns(35)));
                assert_eq!(info.nodes, Some(15234));
                assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_info_bound_and_multipv() {
        let msg = parse_uci_message(
            "info depth 20 seldepth 28 multipv 2 score cp -14 upperbound nodes 900 nps 45000 pv d2d4 g8f6",
        )
        .unwrap();
        let UciMessage::Info(info) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(info.multipv, Some(2));
        assert_eq!(info.score, Some(Score::Centipawns(-14)));
        assert_eq!(info.nodes, Some(900));
        assert_eq!(info.nps, Some(45000));
        assert_eq!(info.pv, vec!["d2d4", "g8f6"]);
    }

    #[test]
    fn test_engine_event_from_info() {
        let event = parse_engine_event("info depth 9 score mate -3 pv h7h8q g8h8").unwrap();
        assert_eq!(
            event,
            EngineEvent::Info(EngineInfo {
                multipv: 1,
                depth: Some(9),
                score: None,
                mate: Some(-3),
                best_move: Some("h7h8q".to_string()),
                pv: Some(vec!["h7h8q".to_string(), "g8h8".to_string()]),
            })
        );
    }

    #[test]
    fn test_engine_event_skips_progress_lines() {
        assert!(parse_engine_event("info depth 5 currmove e2e4 currmovenumber 1").is_none());
        assert!(parse_engine_event("info depth 5 score cp 10").is_none());
        assert!(parse_engine_event("info string NNUE evaluation enabled").is_none());
        assert!(parse_engine_event("readyok").is_none());
        assert!(parse_engine_event("Stockfish 16 by the Stockfish developers").is_none());
    }

    #[test]
    fn test_engine_event_from_bestmove() {
        assert_eq!(
            parse_engine_event("bestmove g1f3"),
            Some(EngineEvent::BestMove(BestMove {
                mv: "g1f3".to_string(),
                ponder: None
            }))
        );
    }

    #[test]
    fn test_is_uci_move() {
        assert!(is_uci_move("e2e4"));
        assert!(is_uci_move("a7a8q"));
        assert!(!is_uci_move("e2e9"));
        assert!(!is_uci_move("e2e4x"));
        assert!(!is_uci_move("cp"));
    }
}
