//! In-process pub/sub runtime over crossbeam channels
//!
//! Stands in for the host page's event bus when the toolkit runs outside a
//! browser. Events keep their publication order; events on topics nobody
//! subscribed to are dropped on delivery.

use crate::{input::events::HostEvent, traits::PubSub, MapError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use fxhash::FxHashSet as HashSet;
use serde_json::Value;

pub struct ChannelPubSub {
    tx: Sender<HostEvent>,
    rx: Receiver<HostEvent>,
    subscriptions: HashSet<String>,
}

impl ChannelPubSub {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            subscriptions: HashSet::default(),
        }
    }

    /// Cloneable handle for other page components firing events
    pub fn publisher(&self) -> Publisher {
        Publisher {
            tx: self.tx.clone(),
        }
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }

    /// Events waiting for delivery, subscribed or not
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for ChannelPubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSub for ChannelPubSub {
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.subscriptions.insert(topic.to_string());
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) {
        self.subscriptions.remove(topic);
    }

    fn publish(&self, topic: &str, payload: Value) -> Result<()> {
        send(&self.tx, topic, payload)
    }

    fn next_event(&mut self) -> Option<HostEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.subscriptions.contains(&event.topic) {
                return Some(event);
            }
            log::trace!("dropping event on unsubscribed topic {}", event.topic);
        }
        None
    }
}

/// Publishing side of a [`ChannelPubSub`]
#[derive(Clone)]
pub struct Publisher {
    tx: Sender<HostEvent>,
}

impl Publisher {
    pub fn fire(&self, topic: &str, payload: Value) -> Result<()> {
        send(&self.tx, topic, payload)
    }
}

fn send(tx: &Sender<HostEvent>, topic: &str, payload: Value) -> Result<()> {
    tx.send(HostEvent::new(topic, payload))
        .map_err(|_| MapError::Host(format!("pub/sub closed, lost event on {topic}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delivers_subscribed_topics_in_order() {
        let mut bus = ChannelPubSub::new();
        bus.subscribe("mapbox:add_marker").unwrap();
        let publisher = bus.publisher();

        publisher.fire("mapbox:add_marker", json!(1)).unwrap();
        bus.publish("leaflet:add_marker", json!(2)).unwrap();
        publisher.fire("mapbox:add_marker", json!(3)).unwrap();

        assert_eq!(bus.pending(), 3);
        assert_eq!(bus.next_event().unwrap().payload, json!(1));
        assert_eq!(bus.next_event().unwrap().payload, json!(3));
        assert!(bus.next_event().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = ChannelPubSub::new();
        bus.subscribe("t").unwrap();
        bus.unsubscribe("t");
        bus.publish("t", Value::Null).unwrap();

        assert!(!bus.is_subscribed("t"));
        assert!(bus.next_event().is_none());
    }
}
