/**
 * Change Listener
 *
 * Each backend process runs exactly one listener. It subscribes to the
 * shared broker channel and fans every record out to the local room of the
 * record's project. Payloads that don't decode as a change record are
 * logged and skipped; the listener keeps going.
 *
 * When the broker ends the subscription (a dropped Redis connection, for
 * example) the listener subscribes again, backing off from
 * `RESUBSCRIBE_INITIAL_DELAY` up to `RESUBSCRIBE_MAX_DELAY` between failed
 * attempts. Records published while no subscription is held are not
 * replayed.
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::sync::broker::{BrokerError, BrokerSubscription, ChangeBroker};
use crate::backend::sync::registry::{ConnectionRegistry, DeliveryReport, Outbound};
use crate::shared::ChangeRecord;

pub const RESUBSCRIBE_INITIAL_DELAY: Duration = Duration::from_millis(100);
pub const RESUBSCRIBE_MAX_DELAY: Duration = Duration::from_secs(10);

pub struct ChangeListener;

impl ChangeListener {
    /// Subscribe to `channel` and start fanning records out to `registry`
    ///
    /// The first subscription is established before this returns, so
    /// records published afterwards are never missed, and a broker that is
    /// unreachable at startup is reported to the caller. The task runs until
    /// it is aborted or the runtime shuts down.
    pub async fn start(
        broker: Arc<dyn ChangeBroker>,
        channel: String,
        registry: Arc<ConnectionRegistry>,
    ) -> Result<JoinHandle<()>, BrokerError> {
        let subscription = broker.subscribe(&channel).await?;
        tracing::info!("[Sync] Listening for changes on '{}' ({})", channel, broker.name());

        Ok(tokio::spawn(async move {
            let mut subscription = subscription;
            loop {
                while let Some(payload) = subscription.next_payload().await {
                    dispatch_payload(&registry, &payload);
                }
                tracing::warn!("[Sync] Subscription on '{}' ended, resubscribing", channel);
                subscription = resubscribe(broker.as_ref(), &channel).await;
            }
        }))
    }
}

/// Subscribe again, doubling the delay after each failure
async fn resubscribe(broker: &dyn ChangeBroker, channel: &str) -> BrokerSubscription {
    let mut delay = RESUBSCRIBE_INITIAL_DELAY;
    loop {
        tokio::time::sleep(delay).await;
        match broker.subscribe(channel).await {
            Ok(subscription) => {
                tracing::info!("[Sync] Resubscribed to '{}' ({})", channel, broker.name());
                return subscription;
            }
            Err(e) => {
                tracing::error!("[Sync] Resubscribe to '{}' failed, retrying in {:?}: {}", channel, delay, e);
                delay = (delay * 2).min(RESUBSCRIBE_MAX_DELAY);
            }
        }
    }
}

/// Deliver one broker payload to the room of its project
///
/// Returns `None` when the payload is not a valid change record.
pub fn dispatch_payload(registry: &ConnectionRegistry, payload: &str) -> Option<DeliveryReport> {
    let record: ChangeRecord = match serde_json::from_str(payload) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("[Sync] Skipping malformed change payload: {}", e);
            return None;
        }
    };

    // Re-serialize so clients always see the canonical form
    let outbound: Outbound = match serde_json::to_string(&record) {
        Ok(text) => Arc::from(text),
        Err(e) => {
            tracing::error!("[Sync] Failed to serialize change record: {}", e);
            return None;
        }
    };

    let report = registry.broadcast(record.project_id(), outbound);
    tracing::debug!(
        "[Sync] {} event {} in project {}: delivered to {}, evicted {}",
        record.kind(),
        record.event_id(),
        record.project_id(),
        report.delivered,
        report.evicted
    );
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sync::broker::{MemoryBroker, DEFAULT_CHANNEL};
    use crate::backend::sync::registry::LiveConnection;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// Broker whose first subscription is already closed and whose second
    /// attempt fails outright; later attempts reach `inner`
    struct DroppingBroker {
        inner: MemoryBroker,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ChangeBroker for DroppingBroker {
        async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
            self.inner.publish(channel, payload).await
        }

        async fn subscribe(&self, channel: &str) -> Result<BrokerSubscription, BrokerError> {
            match self.attempts.fetch_add(1, Ordering::SeqCst) {
                0 => {
                    let (_tx, receiver) = mpsc::channel(1);
                    Ok(BrokerSubscription::new(receiver))
                }
                1 => Err(BrokerError::Subscribe("connection refused".to_string())),
                _ => self.inner.subscribe(channel).await,
            }
        }

        fn name(&self) -> &'static str {
            "dropping"
        }
    }

    #[test]
    fn test_dispatch_reaches_only_the_record_project() {
        let registry = ConnectionRegistry::new();
        let (watcher, mut watcher_rx) = LiveConnection::new("alice", 8);
        let (outsider, mut outsider_rx) = LiveConnection::new("bob", 8);
        registry.join(3, watcher);
        registry.join(4, outsider);

        let payload = serde_json::to_string(&ChangeRecord::deleted(3, 9)).unwrap();
        let report = dispatch_payload(&registry, &payload).unwrap();

        assert_eq!(report.delivered, 1);
        let received: Value = serde_json::from_str(&watcher_rx.try_recv().unwrap()).unwrap();
        assert_eq!(received["type"], "deleted");
        assert_eq!(received["event_id"], 9);
        assert!(outsider_rx.try_recv().is_err());
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let registry = ConnectionRegistry::new();
        let (conn, mut rx) = LiveConnection::new("alice", 8);
        registry.join(1, conn);

        assert!(dispatch_payload(&registry, "not json").is_none());
        assert!(dispatch_payload(&registry, r#"{"type":"renamed","project_id":1}"#).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_payload_for_empty_room_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let payload = serde_json::to_string(&ChangeRecord::deleted(5, 1)).unwrap();

        assert_eq!(dispatch_payload(&registry, &payload), Some(DeliveryReport::default()));
    }

    #[tokio::test]
    async fn test_listener_keeps_running_after_bad_payload() {
        let broker = Arc::new(MemoryBroker::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let (conn, mut rx) = LiveConnection::new("alice", 8);
        registry.join(1, conn);

        let _task = ChangeListener::start(broker.clone(), DEFAULT_CHANNEL.to_string(), registry.clone())
            .await
            .unwrap();

        broker.publish(DEFAULT_CHANNEL, "garbage".to_string()).await.unwrap();
        let payload = serde_json::to_string(&ChangeRecord::deleted(1, 2)).unwrap();
        broker.publish(DEFAULT_CHANNEL, payload).await.unwrap();

        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let record: ChangeRecord = serde_json::from_str(&received).unwrap();
        assert_eq!(record, ChangeRecord::deleted(1, 2));
    }

    #[tokio::test]
    async fn test_listener_resubscribes_after_broker_drop() {
        let inner = MemoryBroker::new();
        let broker = Arc::new(DroppingBroker {
            inner: inner.clone(),
            attempts: AtomicUsize::new(0),
        });
        let registry = Arc::new(ConnectionRegistry::new());
        let (conn, mut rx) = LiveConnection::new("alice", 8);
        registry.join(1, conn);

        let task = ChangeListener::start(broker.clone(), DEFAULT_CHANNEL.to_string(), registry.clone())
            .await
            .unwrap();

        timeout(Duration::from_secs(5), async {
            while inner.subscriber_count(DEFAULT_CHANNEL) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(broker.attempts.load(Ordering::SeqCst), 3);
        assert!(!task.is_finished());

        let payload = serde_json::to_string(&ChangeRecord::deleted(1, 7)).unwrap();
        inner.publish(DEFAULT_CHANNEL, payload).await.unwrap();

        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let record: ChangeRecord = serde_json::from_str(&received).unwrap();
        assert_eq!(record, ChangeRecord::deleted(1, 7));
    }
}
