//! Topic Registry
//!
//! Maps broadcast destinations onto tokio broadcast channels, one per topic
//! string, created on first use. Publications are serialized once and the
//! resulting frame is cloned per subscriber. Fire-and-forget: a topic with
//! no subscribers drops the frame, and a lagging subscriber loses the
//! oldest frames rather than slowing the publisher.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{error, trace};

use crate::network::protocol::{ServerMessage, TopicFrame};
use crate::session::broadcast::{Broadcaster, Destination, Outbound};

/// Per-topic buffer: a subscriber this far behind starts losing frames.
const TOPIC_CHANNEL_CAPACITY: usize = 64;

/// Channel-backed implementation of the [`Broadcaster`] seam.
#[derive(Default)]
pub struct TopicBroadcaster {
    channels: RwLock<BTreeMap<String, broadcast::Sender<String>>>,
}

impl TopicBroadcaster {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic, creating its channel if needed.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(topic.to_owned())
            .or_insert_with(|| broadcast::channel(TOPIC_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Broadcaster for TopicBroadcaster {
    fn publish(&self, destination: Destination, payload: Outbound) {
        let topic = destination.topic();
        let frame = ServerMessage::Topic(TopicFrame {
            destination: topic.clone(),
            body: payload,
        });
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(topic, "failed to serialize outbound frame: {e}");
                return;
            }
        };

        let sender = {
            let channels = self
                .channels
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            channels.get(&topic).cloned()
        };

        match sender {
            Some(sender) => {
                // Err means no live subscribers; that is fine.
                let _ = sender.send(text);
            }
            None => trace!(topic, "publish to topic with no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ball::BallAnimation;
    use crate::session::broadcast::{Notice, NoticeCode};

    #[tokio::test]
    async fn test_subscriber_receives_published_frame() {
        let topics = TopicBroadcaster::new();
        let mut rx = topics.subscribe("/topic/game.g1.ball");

        topics.publish(
            Destination::Ball("g1".into()),
            Outbound::Ball(BallAnimation::lobby()),
        );

        let frame = rx.recv().await.unwrap();
        assert!(frame.contains(r#""destination":"/topic/game.g1.ball""#));
        assert!(frame.contains(r#""startX""#));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let topics = TopicBroadcaster::new();
        topics.publish(
            Destination::Messages {
                room_id: "g1".into(),
                token: "nobody".into(),
            },
            Outbound::Notice(Notice::error(NoticeCode::GameNotFound)),
        );
        assert_eq!(topics.subscriber_count("/topic/game.g1.messages.nobody"), 0);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let topics = TopicBroadcaster::new();
        let mut ball_rx = topics.subscribe("/topic/game.g1.ball");
        let _roster_rx = topics.subscribe("/topic/game.g1.players");

        topics.publish(
            Destination::Roster("g1".into()),
            Outbound::Notice(Notice::info(NoticeCode::NewPlayer)),
        );

        assert!(
            ball_rx.try_recv().is_err(),
            "roster publication must not reach the ball topic"
        );
    }
}
