use tokio::time::Instant;

use crate::config::BridgeConfig;

/// Last-value-wins throttle for raw engine lines.
#[derive(Debug, Default)]
pub struct MessageThrottle {
    buffer: Vec<String>,
    deadline: Option<Instant>,
}

impl MessageThrottle {
    /// Buffer a line, arming the timer if the channel is idle.
    ///
    /// Lines are dropped on arrival while message emission is disabled.
    pub fn ingest(&mut self, line: String, config: &BridgeConfig, now: Instant) -> bool {
        if !config.events.emit_message {
            return false;
        }
        self.buffer.push(line);
        if self.deadline.is_none() {
            self.deadline = Some(now + config.throttling.message_interval());
        }
        true
    }

    /// Handle the timer firing. Returns the line to broadcast, if any.
    pub fn flush(&mut self, config: &BridgeConfig, now: Instant) -> Option<String> {
        self.deadline = None;

        if !config.events.emit_message {
            self.buffer.clear();
            return None;
        }

        let latest = self.buffer.pop()?;
        if !self.buffer.is_empty() {
            tracing::trace!(skipped = self.buffer.len(), "Coalesced raw messages");
            self.buffer.clear();
        }
        self.deadline = Some(now + config.throttling.message_interval());
        Some(latest)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.buffer.clear();
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
