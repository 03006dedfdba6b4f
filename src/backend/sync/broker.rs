/**
 * Change Broker
 *
 * The broker is the external publish/subscribe channel that keeps several
 * backend processes consistent. Every process publishes its committed
 * changes to one shared channel (`project-events` by default) and every
 * process runs one listener on that channel, including for its own
 * changes: local connections are reached through the broker like everyone
 * else's.
 *
 * # Implementations
 *
 * - `MemoryBroker` - `tokio::sync::broadcast` per channel. One instance
 *   shared by several `AppState`s behaves like several processes sharing a
 *   broker.
 * - `RedisBroker` (feature `redis-broker`) - Redis `PUBLISH`/`SUBSCRIBE`.
 *
 * # Subscriptions
 *
 * `subscribe` hands back a `BrokerSubscription` backed by an mpsc queue.
 * A dedicated task owns the broker-side subscription and feeds the queue,
 * so waiting for the broker is decoupled from delivering to connections.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

/// Channel name shared by every backend process
pub const DEFAULT_CHANNEL: &str = "project-events";

/// Payloads buffered between the broker-side task and the listener
pub const SUBSCRIPTION_BUFFER: usize = 1024;

/// Broker failures
///
/// None of these roll back a committed mutation; on the publish path they
/// only mean other connections won't see the change live.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker connection failed: {0}")]
    Connection(String),
    #[error("Broker publish failed: {0}")]
    Publish(String),
    #[error("Broker subscribe failed: {0}")]
    Subscribe(String),
}

/// Stream of raw payloads received on one channel
pub struct BrokerSubscription {
    receiver: mpsc::Receiver<String>,
}

impl BrokerSubscription {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Wait for the next payload; `None` once the broker side has gone away
    pub async fn next_payload(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

/// External publish/subscribe channel
#[async_trait]
pub trait ChangeBroker: Send + Sync {
    /// Publish one serialized record to `channel`
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError>;

    /// Subscribe to `channel`; payloads published after this returns are delivered
    async fn subscribe(&self, channel: &str) -> Result<BrokerSubscription, BrokerError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// In-process broker
///
/// Cloning shares the underlying channels.
///
/// Each channel keeps the last `capacity` payloads for its subscribers. A
/// subscriber that falls further behind than that skips the oldest ones
/// (logged as lag) and resumes at the oldest payload still held, so
/// delivery is only at-least-once up to that bound. Use `with_capacity`
/// when bursts can exceed `SUBSCRIPTION_BUFFER`.
#[derive(Clone)]
pub struct MemoryBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIPTION_BUFFER)
    }

    /// `capacity` bounds how far a subscriber may fall behind before it
    /// starts losing payloads
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscriptions on a channel
    pub fn subscriber_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.get(channel).map_or(0, |sender| sender.receiver_count())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeBroker for MemoryBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        match self.sender(channel).send(payload) {
            Ok(receivers) => {
                tracing::debug!("[Broker] Published to '{}' ({} subscribers)", channel, receivers);
            }
            Err(_) => {
                tracing::debug!("[Broker] No subscribers on '{}'", channel);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<BrokerSubscription, BrokerError> {
        let mut source = self.sender(channel).subscribe();
        let (tx, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let channel = channel.to_string();

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Broker] Subscription on '{}' lagged, {} records skipped", channel, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("[Broker] Subscription on '{}' ended", channel);
        });

        Ok(BrokerSubscription::new(receiver))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
