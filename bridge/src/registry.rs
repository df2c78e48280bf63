//! Ordered listener lists for the three output channels.
//!
//! Listeners are identified by a generated [`ListenerId`] rather than by
//! closure identity. Registering the same closure twice yields two ids and
//! two invocations per broadcast.

use std::fmt;
use std::sync::Arc;

use engine::BestMove;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregation::ConsolidatedAnalysis;

pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Message,
    Analysis,
    BestMove,
}

pub struct ListenerRegistry<T> {
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T> ListenerRegistry<T> {
    pub fn add(&mut self, listener: Listener<T>) -> ListenerId {
        let id = ListenerId::generate();
        self.listeners.push((id, listener));
        id
    }

    /// Returns whether anything was removed. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(lid, _)| *lid == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invoke every listener in registration order.
    pub fn notify(&self, value: &T) {
        for (_, listener) in &self.listeners {
            listener(value);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// The three channel registries, owned by the actor.
#[derive(Default)]
pub struct Subscribers {
    pub message: ListenerRegistry<String>,
    pub analysis: ListenerRegistry<ConsolidatedAnalysis>,
    pub best_move: ListenerRegistry<BestMove>,
}

impl Subscribers {
    pub fn remove(&mut self, channel: Channel, id: ListenerId) -> bool {
        match channel {
            Channel::Message => self.message.remove(id),
            Channel::Analysis => self.analysis.remove(id),
            Channel::BestMove => self.best_move.remove(id),
        }
    }

    pub fn clear(&mut self) {
        self.message.clear();
        self.analysis.clear();
        self.best_move.clear();
    }

    pub fn count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Message => self.message.len(),
            Channel::Analysis => self.analysis.len(),
            Channel::BestMove => self.best_move.len(),
        }
    }
}
