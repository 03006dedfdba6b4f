/**
 * Redis Broker
 *
 * Multi-process deployments point every backend at the same Redis server
 * via `BROKER_URL`. Publishing goes through one multiplexed connection;
 * each subscription opens its own pub/sub connection, owned by a task that
 * forwards payloads into the subscription queue.
 */

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;

use crate::backend::sync::broker::{BrokerError, BrokerSubscription, ChangeBroker, SUBSCRIPTION_BUFFER};

pub struct RedisBroker {
    client: redis::Client,
    publisher: redis::aio::MultiplexedConnection,
}

impl RedisBroker {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url)
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tracing::info!("[Broker] Connected to Redis at {}", url);
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl ChangeBroker for RedisBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn
            .publish(channel, payload)
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        tracing::debug!("[Broker] Published to '{}' ({} subscribers)", channel, receivers);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<BrokerSubscription, BrokerError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BrokerError::Subscribe(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| BrokerError::Subscribe(e.to_string()))?;

        let (tx, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let channel = channel.to_string();

        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(message) = messages.next().await {
                match message.get_payload::<String>() {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("[Broker] Dropping non-text payload on '{}': {}", channel, e);
                    }
                }
            }
            tracing::warn!("[Broker] Redis subscription on '{}' ended", channel);
        });

        Ok(BrokerSubscription::new(receiver))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
