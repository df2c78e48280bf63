use engine::EngineInfo;
use tokio::time::Instant;

use crate::aggregation::{AggregationBuffer, ConsolidatedAnalysis};
use crate::config::BridgeConfig;

/// Interval-driven flush of the multi-PV buffer, closed early by a best move.
#[derive(Debug, Default)]
pub struct AnalysisThrottle {
    buffer: AggregationBuffer,
    deadline: Option<Instant>,
}

impl AnalysisThrottle {
    /// Buffer an update in its PV slot, arming the timer if idle.
    pub fn ingest(&mut self, info: EngineInfo, config: &BridgeConfig, now: Instant) -> bool {
        if !config.events.analysis_live() {
            return false;
        }
        self.buffer.upsert(info);
        if self.deadline.is_none() {
            self.deadline = Some(now + config.throttling.analysis_interval());
        }
        true
    }

    /// Handle the timer firing. Returns the snapshot to broadcast, if any.
    ///
    /// The buffer is emptied on every flush that finds work, whether or not
    /// analysis emission is on.
    pub fn flush(
        &mut self,
        config: &BridgeConfig,
        now: Instant,
        fen: Option<&str>,
    ) -> Option<ConsolidatedAnalysis> {
        self.deadline = None;

        if !config.events.analysis_live() {
            self.buffer.clear();
            return None;
        }
        if self.buffer.is_empty() {
            return None;
        }

        let snapshot = config
            .events
            .emit_analysis
            .then(|| self.buffer.consolidate(fen));
        self.buffer.clear();
        self.deadline = Some(now + config.throttling.analysis_interval());
        snapshot
    }

    /// End the current round: drop buffered updates and disarm the timer.
    /// Returns how many PV entries were discarded.
    pub fn close_round(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.deadline = None;
        dropped
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigUpdate;

    fn info(multipv: u32, depth: u32) -> EngineInfo {
        EngineInfo {
            multipv,
            depth: Some(depth),
            ..Default::default()
        }
    }

    #[test]
    fn test_ingest_arms_once() {
        let config = BridgeConfig::default();
        let now = Instant::now();
        let mut throttle = AnalysisThrottle::default();

        throttle.ingest(info(1, 1), &config, now);
        let armed = throttle.deadline();
        throttle.ingest(info(2, 1), &config, now + config.throttling.analysis_interval() / 2);

        assert_eq!(throttle.deadline(), armed);
        assert_eq!(throttle.buffered(), 2);
    }

    #[test]
    fn test_flush_consolidates_then_rearms() {
        let config = BridgeConfig::default();
        let now = Instant::now();
        let mut throttle = AnalysisThrottle::default();
        throttle.ingest(info(1, 10), &config, now);
        throttle.ingest(info(1, 11), &config, now);

        let snapshot = throttle.flush(&config, now, None).unwrap();
        assert_eq!(snapshot.depths, vec![11]);
        assert_eq!(throttle.buffered(), 0);
        assert!(throttle.is_pending());

        // Nothing new arrived: next fire goes idle
        assert!(throttle.flush(&config, now, None).is_none());
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_best_move_only_still_drains() {
        let mut config = BridgeConfig::default();
        config.apply(ConfigUpdate {
            emit_analysis: Some(false),
            ..Default::default()
        });
        let now = Instant::now();
        let mut throttle = AnalysisThrottle::default();

        assert!(throttle.ingest(info(1, 4), &config, now));
        assert!(throttle.flush(&config, now, None).is_none());
        assert_eq!(throttle.buffered(), 0);
        assert!(throttle.is_pending());
    }

    #[test]
    fn test_fully_disabled_ignores_updates() {
        let mut config = BridgeConfig::default();
        config.apply(ConfigUpdate {
            emit_analysis: Some(false),
            emit_best_move: Some(false),
            ..Default::default()
        });
        let mut throttle = AnalysisThrottle::default();

        assert!(!throttle.ingest(info(1, 4), &config, Instant::now()));
        assert!(!throttle.is_pending());
        assert_eq!(throttle.buffered(), 0);
    }

    #[test]
    fn test_close_round_discards_pending_work() {
        let config = BridgeConfig::default();
        let now = Instant::now();
        let mut throttle = AnalysisThrottle::default();
        throttle.ingest(info(1, 7), &config, now);
        throttle.ingest(info(2, 7), &config, now);

        assert_eq!(throttle.close_round(), 2);
        assert!(!throttle.is_pending());
        assert!(throttle.flush(&config, now, None).is_none());
    }
}
