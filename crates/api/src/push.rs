use std::sync::{Arc, Weak};

use eyre::{Context as _, Result};
use log::debug;
use model::notification::PushMessage;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    id: u64,
    topic_filter: String,
    tx: UnboundedSender<PushMessage>,
}

/// Fans push messages out to the live subscriptions.
///
/// Messages published while nobody is subscribed are dropped.
#[derive(Clone, Default)]
pub struct PushHub {
    registry: Arc<Mutex<Registry>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to messages whose topic contains `topic_filter`.
    pub fn subscribe(&self, topic_filter: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.push(Subscriber {
            id,
            topic_filter: topic_filter.to_string(),
            tx,
        });
        debug!("push subscription {} on {:?}", id, topic_filter);
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers the message; returns the number of subscriptions that received it.
    pub fn publish(&self, message: PushMessage) -> usize {
        let mut registry = self.registry.lock();
        registry.subscribers.retain(|s| !s.tx.is_closed());
        let mut delivered = 0;
        for subscriber in &registry.subscribers {
            if message.topic.contains(&subscriber.topic_filter)
                && subscriber.tx.send(message.clone()).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Publishes a raw `{"topic": .., "content": ..}` frame from the transport.
    pub fn publish_frame(&self, frame: &str) -> Result<usize> {
        let message = serde_json::from_str::<PushMessage>(frame)
            .with_context(|| format!("Invalid push frame: {}", frame))?;
        Ok(self.publish(message))
    }

    pub fn subscribers(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

/// Handle of one subscription. Dropping it deregisters the subscription.
pub struct Subscription {
    id: u64,
    rx: UnboundedReceiver<PushMessage>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.rx.recv().await
    }

    /// Next queued message without waiting.
    pub fn try_recv(&mut self) -> Option<PushMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().subscribers.retain(|s| s.id != self.id);
            debug!("push subscription {} closed", self.id);
        }
    }
}
