//! Throttle state machines for the raw-message and analysis channels.
//!
//! Each channel owns at most one pending deadline. Ingestion arms it when the
//! channel is idle; a flush either broadcasts and re-arms it one interval
//! later, or finds nothing to do and leaves the channel idle. The actor waits
//! on the deadlines; these types never sleep themselves.

mod analysis;
mod message;

pub use analysis::AnalysisThrottle;
pub use message::MessageThrottle;
