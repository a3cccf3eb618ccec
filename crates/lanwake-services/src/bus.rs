//! Messaging channel seam and the in-process bus behind it.
//!
//! The engine only ever publishes text to a named topic. `MessageBus` keeps
//! a bounded history for API readers and fans each message out to live
//! subscribers. A broker bridge would implement `MessageChannel` the same way.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::broadcast;

use lanwake_core::ChannelError;

/// Outbound side of the messaging channel.
pub trait MessageChannel: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError>;
}

/// Serialize `payload` as JSON and publish it. Best-effort: failures are
/// logged and reported as `false`, never propagated.
pub fn publish_json<T: Serialize>(channel: &dyn MessageChannel, topic: &str, payload: &T) -> bool {
    let text = match serde_json::to_string(payload) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(topic, error = %e, "failed to encode channel message");
            return false;
        }
    };
    match channel.publish(topic, &text) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(topic, error = %e, "publish failed, dropping message");
            false
        }
    }
}

/// One message handed to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    pub topic: String,
    pub payload: String,
}

struct BusInner {
    history: VecDeque<Published>,
    limit: usize,
    next_seq: u64,
}

/// In-memory channel with bounded history and live fan-out.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<Mutex<BusInner>>,
    tx: broadcast::Sender<Published>,
}

impl MessageBus {
    /// Create a bus retaining at most `history` messages.
    pub fn new(history: usize) -> Self {
        let (tx, _) = broadcast::channel(history.max(16));
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                history: VecDeque::with_capacity(history),
                limit: history,
                next_seq: 1,
            })),
            tx,
        }
    }

    /// Receive every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.tx.subscribe()
    }

    /// Retained messages with `seq > since`, oldest first.
    pub fn since(&self, since: u64) -> Vec<Published> {
        match self.inner.lock() {
            Ok(inner) => inner
                .history
                .iter()
                .filter(|m| m.seq > since)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Retained messages on one topic, oldest first.
    pub fn on_topic(&self, topic: &str) -> Vec<Published> {
        self.since(0).into_iter().filter(|m| m.topic == topic).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.history.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageChannel for MessageBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError> {
        if topic.is_empty() {
            return Err(ChannelError::Rejected("empty topic".to_string()));
        }

        let message = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|_| ChannelError::Rejected("bus state poisoned".to_string()))?;
            let message = Published {
                seq: inner.next_seq,
                topic: topic.to_string(),
                payload: payload.to_string(),
            };
            inner.next_seq += 1;
            if inner.limit > 0 {
                if inner.history.len() == inner.limit {
                    inner.history.pop_front();
                }
                inner.history.push_back(message.clone());
            }
            message
        };

        tracing::debug!(topic, seq = message.seq, bytes = payload.len(), "message published");
        // No subscribers is fine.
        let _ = self.tx.send(message);
        Ok(())
    }
}
