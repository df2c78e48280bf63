//! Mock EngineBackend implementation for testing

use crate::{EngineBackend, EngineError, EngineEvent, EngineFeeds, FEED_CAPACITY};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Scriptable in-process engine. Clones share state, so a test can keep one
/// clone to drive the feeds while the bridge owns another.
#[derive(Clone)]
pub struct MockEngine {
    output_tx: broadcast::Sender<String>,
    event_tx: broadcast::Sender<EngineEvent>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    running: Arc<AtomicBool>,
    fail_init: Arc<AtomicBool>,
    fail_shutdown: Arc<AtomicBool>,
    reject_commands: Arc<AtomicBool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Init,
    SendCommand(String),
    Shutdown,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        let (output_tx, _) = broadcast::channel(FEED_CAPACITY);
        let (event_tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            output_tx,
            event_tx,
            call_log: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            fail_init: Arc::new(AtomicBool::new(false)),
            fail_shutdown: Arc::new(AtomicBool::new(false)),
            reject_commands: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every `init_engine` call fail
    pub fn with_failing_init(self) -> Self {
        self.fail_init.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `shutdown_engine` call fail
    pub fn with_failing_shutdown(self) -> Self {
        self.fail_shutdown.store(true, Ordering::SeqCst);
        self
    }

    /// Answer every command with `Ok(false)`
    pub fn with_rejected_commands(self) -> Self {
        self.reject_commands.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Push a raw output line to every subscriber.
    pub fn emit_output(&self, line: impl Into<String>) {
        let _ = self.output_tx.send(line.into());
    }

    /// Push a parsed event to every subscriber.
    pub fn emit_event(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Commands forwarded so far, in order.
    pub fn sent_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::SendCommand(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn init_count(&self) -> usize {
        self.count(&MockCall::Init)
    }

    pub fn shutdown_count(&self) -> usize {
        self.count(&MockCall::Shutdown)
    }

    /// Live subscriptions on the (output, events) feeds.
    pub fn subscriber_counts(&self) -> (usize, usize) {
        (
            self.output_tx.receiver_count(),
            self.event_tx.receiver_count(),
        )
    }

    fn count(&self, wanted: &MockCall) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|call| *call == wanted)
            .count()
    }

    fn log(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EngineBackend for MockEngine {
    async fn init_engine(&self) -> Result<(), EngineError> {
        self.log(MockCall::Init);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(EngineError::NotFound);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_command(&self, command: &str) -> Result<bool, EngineError> {
        self.log(MockCall::SendCommand(command.to_string()));
        if !self.running.load(Ordering::SeqCst) {
            return Err(EngineError::NotRunning);
        }
        Ok(!self.reject_commands.load(Ordering::SeqCst))
    }

    async fn shutdown_engine(&self) -> Result<(), EngineError> {
        self.log(MockCall::Shutdown);
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> EngineFeeds {
        EngineFeeds {
            output: self.output_tx.subscribe(),
            events: self.event_tx.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_and_feeds() {
        let engine = MockEngine::new();
        let mut feeds = engine.subscribe();

        engine.init_engine().await.unwrap();
        assert!(engine.send_command("isready").await.unwrap());
        engine.emit_output("readyok");

        assert_eq!(feeds.output.recv().await.unwrap(), "readyok");
        assert_eq!(
            engine.calls(),
            vec![MockCall::Init, MockCall::SendCommand("isready".to_string())]
        );
    }

    #[tokio::test]
    async fn test_mock_send_requires_init() {
        let engine = MockEngine::new();
        assert!(matches!(
            engine.send_command("go").await,
            Err(EngineError::NotRunning)
        ));
    }

    #[test]
    fn test_dropping_feeds_releases_subscription() {
        let engine = MockEngine::new();
        let feeds = engine.subscribe();
        assert_eq!(engine.subscriber_counts(), (1, 1));
        drop(feeds);
        assert_eq!(engine.subscriber_counts(), (0, 0));
    }
}
