//! In-process pub/sub with the same contract as the sidecar broker:
//! fan-out to every subscriber, at-least-once, FIFO per subscription.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use prodmon_api::{BoxFuture, Broker, Disposition, EventHandler, MonitorError};

// ═══════════════════════════════════════════════════════════════
//  Overflow policy
// ═══════════════════════════════════════════════════════════════

/// What to do when a subscriber's bounded channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// try_send(): drop the message and log it.
    Drop,
    /// Queue the message; a per-subscriber task waits for room, in order.
    BackPressure,
}

// ═══════════════════════════════════════════════════════════════
//  Subscription
// ═══════════════════════════════════════════════════════════════

/// Where `fan_out` hands a message to one subscriber.
enum Inlet {
    /// Bounded channel fed with try_send().
    Direct(mpsc::Sender<Vec<u8>>),
    /// Unbounded queue drained into the bounded channel by a forwarding task.
    Queued(mpsc::UnboundedSender<Vec<u8>>),
}

impl Inlet {
    fn is_closed(&self) -> bool {
        match self {
            Inlet::Direct(tx) => tx.is_closed(),
            Inlet::Queued(tx) => tx.is_closed(),
        }
    }
}

/// Move queued messages into `out` in order, waiting for room.
/// Exits once the subscription is dropped.
fn spawn_forwarder(topic: String, mut queue: mpsc::UnboundedReceiver<Vec<u8>>, out: mpsc::Sender<Vec<u8>>) {
    tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                _ = out.closed() => break,
                msg = queue.recv() => match msg {
                    Some(m) => m,
                    None => break,
                },
            };
            if out.send(msg).await.is_err() {
                break;
            }
        }
        tracing::debug!(topic = %topic, "forwarder stopped");
    });
}

/// Receiving end of one subscription: a stream of envelope bytes.
pub struct MpscSubscription {
    topic: String,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl MpscSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next message. `None` once the broker is dropped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryBroker
// ═══════════════════════════════════════════════════════════════

/// Named topics with unified mpsc subscribers.
///
/// Publishing to a topic nobody subscribed to succeeds and the message
/// is discarded, as on a real pub/sub channel.
#[derive(Default)]
pub struct MemoryBroker {
    topics: RwLock<HashMap<String, Vec<Inlet>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, topic: &str, buffer: usize, overflow: OverflowPolicy) -> MpscSubscription {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let inlet = match overflow {
            OverflowPolicy::Drop => Inlet::Direct(tx),
            OverflowPolicy::BackPressure => {
                let (queue_tx, queue_rx) = mpsc::unbounded_channel();
                spawn_forwarder(topic.to_string(), queue_rx, tx);
                Inlet::Queued(queue_tx)
            }
        };
        let mut topics = self.topics.write().await;
        topics.entry(topic.to_string()).or_default().push(inlet);
        MpscSubscription {
            topic: topic.to_string(),
            rx,
        }
    }

    /// Number of live subscribers on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    async fn fan_out(&self, topic: &str, envelope: Vec<u8>) {
        let mut topics = self.topics.write().await;
        let Some(subs) = topics.get_mut(topic) else {
            tracing::debug!(topic, "no subscribers, message discarded");
            return;
        };
        // Never awaits a subscriber: a full one cannot stall the others.
        subs.retain(|inlet| match inlet {
            Inlet::Direct(tx) => match tx.try_send(envelope.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(topic, "subscriber channel full, dropping");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
            Inlet::Queued(tx) => tx.send(envelope.clone()).is_ok(),
        });
    }
}

impl Broker for MemoryBroker {
    fn publish(&self, topic: &str, envelope: Vec<u8>) -> BoxFuture<'_, Result<(), MonitorError>> {
        let topic = topic.to_string();
        Box::pin(async move {
            self.fan_out(&topic, envelope).await;
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Dispatch: subscription → handler, with redelivery
// ═══════════════════════════════════════════════════════════════

/// Redelivery policy of the in-process dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct Redelivery {
    /// Deliveries per message, including the first.
    pub max_deliveries: u32,
    pub delay: Duration,
}

impl Default for Redelivery {
    fn default() -> Self {
        Self {
            max_deliveries: 3,
            delay: Duration::from_millis(100),
        }
    }
}

/// Push every message of `subscription` into `handler`, one at a time.
///
/// `Retry` outcomes are redelivered per `redelivery`; `Drop` outcomes and
/// exhausted messages are logged and skipped.
pub fn spawn_dispatch(
    route: String,
    mut subscription: MpscSubscription,
    handler: Arc<dyn EventHandler>,
    redelivery: Redelivery,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let envelope = tokio::select! {
                _ = token.cancelled() => break,
                msg = subscription.recv() => match msg {
                    Some(m) => m,
                    None => break,
                },
            };
            deliver(&route, subscription.topic(), &*handler, &envelope, redelivery).await;
        }
        tracing::info!(route = %route, "dispatch stopped");
    })
}

async fn deliver(route: &str, topic: &str, handler: &dyn EventHandler, envelope: &[u8], redelivery: Redelivery) {
    let mut delivery = 1;
    loop {
        let err = match handler.handle(envelope).await {
            Ok(()) => return,
            Err(e) => e,
        };
        match err.disposition() {
            Disposition::Retry if delivery < redelivery.max_deliveries => {
                tracing::warn!(route, topic, delivery, error = %err, "delivery failed, redelivering");
                tokio::time::sleep(redelivery.delay).await;
                delivery += 1;
            }
            Disposition::Drop => {
                tracing::warn!(route, topic, error = %err, "message dropped");
                return;
            }
            _ => {
                tracing::error!(route, topic, delivery, error = %err, "delivery failed, giving up");
                return;
            }
        }
    }
}
