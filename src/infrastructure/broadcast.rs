//! Topic-scoped subscription registry.
//!
//! ```text
//! publish(topic, event)
//!        │
//!        ▼
//!  rooms: DashMap<Topic, HashMap<SubscriberId, Sender>>
//!        │  snapshot of current members
//!        ▼
//!  subscriber inbox (mpsc) ──▶ websocket / test receiver
//! ```
//!
//! Each subscriber owns one bounded inbox. Joining a room adds the inbox's
//! sender to that room; a subscriber in two rooms receives an event published
//! to both rooms twice. When an inbox is full the event is dropped for that
//! subscriber only; a closed inbox is pruned from the room.

use crate::config::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::event::{DomainEvent, EventEnvelope, Topic};
use crate::domain::ports::EventPublisher;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub type SubscriberId = u64;

#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    rooms: Arc<DashMap<Topic, HashMap<SubscriberId, mpsc::Sender<EventEnvelope>>>>,
    next_id: Arc<AtomicU64>,
    /// Inbox size handed to every new subscriber.
    capacity: usize,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// A connected subscriber: its id and the inbox events arrive in.
#[derive(Debug)]
pub struct Subscriber {
    pub id: SubscriberId,
    sender: mpsc::Sender<EventEnvelope>,
    pub inbox: mpsc::Receiver<EventEnvelope>,
}

impl Subscriber {
    /// Drains whatever is already queued without waiting.
    pub fn drain(&mut self) -> Vec<EventEnvelope> {
        let mut events = Vec::new();
        while let Ok(event) = self.inbox.try_recv() {
            events.push(event);
        }
        events
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose subscribers queue at most `capacity` events.
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            capacity: capacity.max(1),
        }
    }

    /// Registers a subscriber that belongs to no room yet.
    pub fn connect(&self) -> Subscriber {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, inbox) = mpsc::channel(self.capacity);
        tracing::debug!(subscriber = id, "subscriber connected");
        Subscriber { id, sender, inbox }
    }

    pub fn join(&self, subscriber: &Subscriber, topic: Topic) {
        self.rooms
            .entry(topic)
            .or_default()
            .insert(subscriber.id, subscriber.sender.clone());
        tracing::debug!(subscriber = subscriber.id, room = %topic, "joined room");
    }

    pub fn leave(&self, subscriber_id: SubscriberId, topic: Topic) {
        if let Some(mut members) = self.rooms.get_mut(&topic) {
            members.remove(&subscriber_id);
        }
        self.rooms.remove_if(&topic, |_, members| members.is_empty());
        tracing::debug!(subscriber = subscriber_id, room = %topic, "left room");
    }

    /// Removes the subscriber from every room.
    pub fn disconnect(&self, subscriber_id: SubscriberId) {
        for mut room in self.rooms.iter_mut() {
            room.value_mut().remove(&subscriber_id);
        }
        self.rooms.retain(|_, members| !members.is_empty());
        tracing::debug!(subscriber = subscriber_id, "subscriber disconnected");
    }

    pub fn members(&self, topic: Topic) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self
            .rooms
            .get(&topic)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn rooms_of(&self, subscriber_id: SubscriberId) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .rooms
            .iter()
            .filter(|room| room.value().contains_key(&subscriber_id))
            .map(|room| *room.key())
            .collect();
        topics.sort();
        topics
    }
}

impl EventPublisher for SubscriptionRegistry {
    fn publish(&self, topic: Topic, event: &DomainEvent) -> usize {
        let members: Vec<(SubscriberId, mpsc::Sender<EventEnvelope>)> =
            match self.rooms.get(&topic) {
                Some(room) => room.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => return 0,
            };

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, tx) in members {
            let envelope = EventEnvelope {
                topic,
                event: event.clone(),
            };
            match tx.try_send(envelope) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = id, room = %topic, "subscriber inbox full, event dropped");
                }
                Err(TrySendError::Closed(_)) => gone.push(id),
            }
        }
        for id in gone {
            tracing::debug!(subscriber = id, room = %topic, "pruning closed subscriber");
            self.leave(id, topic);
        }
        delivered
    }
}
