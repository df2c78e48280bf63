//! Multi-PV aggregation buffer.
//!
//! Holds the latest [`EngineInfo`] per principal-variation index and merges
//! them into one [`ConsolidatedAnalysis`] at flush time. Slots keep the
//! position of their first insertion; a newer update for the same index
//! replaces the whole entry in place.

use engine::EngineInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct AggregationBuffer {
    entries: Vec<EngineInfo>,
}

impl AggregationBuffer {
    /// Store `info` in the slot for its PV index, overwriting any previous one.
    pub fn upsert(&mut self, info: EngineInfo) {
        match self.entries.iter_mut().find(|e| e.multipv == info.multipv) {
            Some(slot) => *slot = info,
            None => self.entries.push(info),
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, multipv: u32) -> Option<&EngineInfo> {
        self.entries.iter().find(|e| e.multipv == multipv)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge the buffered entries in insertion order.
    pub fn consolidate(&self, fen: Option<&str>) -> ConsolidatedAnalysis {
        let mut out = ConsolidatedAnalysis {
            fen: fen.map(str::to_string),
            ..Default::default()
        };

        for info in &self.entries {
            if let Some(mv) = &info.best_move {
                out.best_moves.push(mv.clone());
            }
            if let Some(score) = info.score {
                out.evaluations.push(score.to_string());
            }
            if let Some(mate) = info.mate {
                out.evaluations.push(format!("mate {}", mate));
            }
            if let Some(pv) = &info.pv {
                out.lines.push(pv.clone());
            }
            if let Some(depth) = info.depth {
                out.depths.push(depth);
            }
        }

        if let [only] = self.entries.as_slice() {
            out.best_move = only.best_move.clone();
            out.score = only.score;
            out.mate = only.mate;
            out.line = only.pv.clone();
            out.depth = only.depth;
        }

        out
    }
}

/// Snapshot of every buffered PV at one flush.
///
/// The sequence fields are aligned by buffer insertion order. The singular
/// fields are only populated when exactly one PV was buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedAnalysis {
    pub best_moves: Vec<String>,
    pub evaluations: Vec<String>,
    pub lines: Vec<Vec<String>>,
    pub depths: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Position of the last `position fen` command sent through the bridge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(multipv: u32) -> EngineInfo {
        EngineInfo {
            multipv,
            ..Default::default()
        }
    }

    #[test]
    fn test_last_write_wins_per_pv() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            depth: Some(8),
            score: Some(10),
            ..info(1)
        });
        buffer.upsert(EngineInfo {
            depth: Some(9),
            mate: Some(4),
            ..info(1)
        });

        assert_eq!(buffer.len(), 1);
        let entry = buffer.get(1).unwrap();
        assert_eq!(entry.depth, Some(9));
        // Whole-entry overwrite, no field merge
        assert_eq!(entry.score, None);
        assert_eq!(entry.mate, Some(4));
    }

    #[test]
    fn test_overwrite_keeps_first_insertion_position() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo { depth: Some(5), ..info(2) });
        buffer.upsert(EngineInfo { depth: Some(5), ..info(1) });
        buffer.upsert(EngineInfo { depth: Some(6), ..info(2) });
        buffer.upsert(EngineInfo { depth: Some(4), ..info(3) });

        let analysis = buffer.consolidate(None);
        assert_eq!(analysis.depths, vec![6, 5, 4]);
    }

    #[test]
    fn test_two_pvs_have_no_singular_fields() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            depth: Some(10),
            score: Some(25),
            ..info(1)
        });
        buffer.upsert(EngineInfo {
            depth: Some(9),
            mate: Some(3),
            ..info(2)
        });

        let analysis = buffer.consolidate(None);
        assert_eq!(analysis.evaluations, vec!["25", "mate 3"]);
        assert_eq!(analysis.depths, vec![10, 9]);
        assert_eq!(analysis.score, None);
        assert_eq!(analysis.depth, None);
        assert_eq!(analysis.mate, None);
        assert_eq!(analysis.best_move, None);
    }

    #[test]
    fn test_single_pv_populates_singular_fields() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            depth: Some(12),
            best_move: Some("e2e4".to_string()),
            pv: Some(vec!["e2e4".to_string(), "e7e5".to_string()]),
            ..info(1)
        });

        let analysis = buffer.consolidate(Some("8/8/8/8/8/8/8/K6k w - - 0 1"));
        assert_eq!(analysis.best_move.as_deref(), Some("e2e4"));
        assert_eq!(analysis.depth, Some(12));
        assert_eq!(analysis.best_moves, vec!["e2e4"]);
        assert_eq!(analysis.depths, vec![12]);
        assert_eq!(analysis.line.as_ref().map(Vec::len), Some(2));
        assert_eq!(analysis.lines.len(), 1);
        assert_eq!(analysis.fen.as_deref(), Some("8/8/8/8/8/8/8/K6k w - - 0 1"));
    }

    #[test]
    fn test_score_and_mate_from_one_entry_both_append() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            score: Some(-40),
            mate: Some(-2),
            ..info(1)
        });

        let analysis = buffer.consolidate(None);
        assert_eq!(analysis.evaluations, vec!["-40", "mate -2"]);
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            best_move: Some("d2d4".to_string()),
            ..info(1)
        });
        buffer.upsert(EngineInfo {
            depth: Some(3),
            ..info(2)
        });

        let analysis = buffer.consolidate(None);
        assert_eq!(analysis.best_moves, vec!["d2d4"]);
        assert_eq!(analysis.depths, vec![3]);
        assert!(analysis.evaluations.is_empty());
        assert!(analysis.lines.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut buffer = AggregationBuffer::default();
        buffer.upsert(EngineInfo {
            best_move: Some("g1f3".to_string()),
            ..info(1)
        });
        let json = serde_json::to_value(buffer.consolidate(None)).unwrap();
        assert_eq!(json["bestMoves"][0], "g1f3");
        assert_eq!(json["bestMove"], "g1f3");
        assert!(json.get("score").is_none());
    }
}
