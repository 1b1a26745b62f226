//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::BattleEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use super::types::{DecisionEvent, TrackerEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Engine notifications (dice, casualties, retreats, outcomes)
    Battle,
    /// Requests routed to providers and their answers
    Decision,
    /// Engagements declared, concluded, aborted or voided
    Tracker,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Battle, Topic::Decision, Topic::Tracker];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Battle(BattleEvent),
    Decision(DecisionEvent),
    Tracker(TrackerEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Battle(_) => Topic::Battle,
            Event::Decision(_) => Topic::Decision,
            Event::Tracker(_) => Topic::Tracker,
        }
    }
}

/// Topic-based event bus
///
/// Consumers subscribe to the topics they care about. Publishing never
/// blocks: with no subscriber, or under lock contention, the event is dropped.
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<Event>>>>,
    /// Per-topic buffer; slow receivers past it see `Lagged`.
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(RwLock::new(channels)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(tx) = channels.get(&topic)
                    && tx.send(event).is_err()
                {
                    tracing::trace!("No subscribers for topic {:?}", topic);
                }
            }
            Err(_) => {
                tracing::debug!("Failed to acquire event bus lock for topic {:?}", topic);
            }
        }
    }

    /// Subscribe to a specific topic.
    pub async fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        let capacity = self.capacity;
        let mut channels = self.channels.write().await;
        channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Subscribe to multiple topics at once.
    pub async fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        let capacity = self.capacity;
        let mut channels = self.channels.write().await;
        topics
            .iter()
            .map(|&topic| {
                let rx = channels
                    .entry(topic)
                    .or_insert_with(|| broadcast::channel(capacity).0)
                    .subscribe();
                (topic, rx)
            })
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            capacity: self.capacity,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{BattleId, SoundClip};

    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut battle_rx = bus.subscribe(Topic::Battle).await;
        let mut tracker_rx = bus.subscribe(Topic::Tracker).await;

        bus.publish(Event::Battle(BattleEvent::Sound {
            battle: BattleId(1),
            clip: SoundClip::Victory,
        }));

        assert!(matches!(
            battle_rx.recv().await,
            Ok(Event::Battle(BattleEvent::Sound { .. }))
        ));
        assert!(matches!(
            tracker_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn receivers_lag_past_the_configured_capacity() {
        let bus = EventBus::with_capacity(2);
        assert_eq!(bus.clone().capacity(), 2);
        let mut receivers = bus.subscribe_multiple(&[Topic::Tracker]).await;
        let rx = receivers.get_mut(&Topic::Tracker).unwrap();

        for id in 1..=3 {
            bus.publish(Event::Tracker(TrackerEvent::Voided {
                battle: BattleId(id),
            }));
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(Event::Tracker(TrackerEvent::Voided { battle: BattleId(2) }))
        ));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(EventBus::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(Event::Tracker(TrackerEvent::Voided {
            battle: BattleId(3),
        }));
    }
}
