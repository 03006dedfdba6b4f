/**
 * Change Publisher
 *
 * Publish side of the change pipeline. `publish` never blocks and never
 * fails from the caller's point of view: records go onto an in-process
 * queue that a single task drains into the broker. One drainer means
 * records leave the process in the order they were enqueued, and the event
 * store enqueues while it still holds its write lock, so that order is the
 * commit order.
 *
 * Broker failures are logged and the record is dropped; the committed
 * mutation stands.
 */

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::sync::broker::ChangeBroker;
use crate::shared::ChangeRecord;

/// Handle used by the event store to hand off committed changes
#[derive(Clone)]
pub struct ChangePublisher {
    queue: mpsc::UnboundedSender<ChangeRecord>,
}

impl ChangePublisher {
    /// Start the drainer task publishing to `channel` on `broker`
    pub fn start(broker: Arc<dyn ChangeBroker>, channel: String) -> (Self, JoinHandle<()>) {
        let (publisher, queue) = Self::channel();
        let handle = tokio::spawn(drain_queue(broker, channel, queue));
        (publisher, handle)
    }

    /// A publisher whose queue is handed back to the caller instead of a broker
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChangeRecord>) {
        let (queue, receiver) = mpsc::unbounded_channel();
        (Self { queue }, receiver)
    }

    /// Enqueue a committed change for distribution
    pub fn publish(&self, record: ChangeRecord) {
        let kind = record.kind();
        let event_id = record.event_id();
        if self.queue.send(record).is_err() {
            tracing::warn!(
                "[Broker] Publisher stopped; {} notification for event {} not distributed",
                kind,
                event_id
            );
        }
    }
}

async fn drain_queue(
    broker: Arc<dyn ChangeBroker>,
    channel: String,
    mut queue: mpsc::UnboundedReceiver<ChangeRecord>,
) {
    tracing::info!("[Broker] Publisher started on '{}' ({})", channel, broker.name());

    while let Some(record) = queue.recv().await {
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("[Broker] Failed to serialize change record: {}", e);
                continue;
            }
        };

        if let Err(e) = broker.publish(&channel, payload).await {
            tracing::warn!(
                "[Broker] {} notification for event {} in project {} not published: {}",
                record.kind(),
                record.event_id(),
                record.project_id(),
                e
            );
        }
    }

    tracing::info!("[Broker] Publisher on '{}' stopped", channel);
}
