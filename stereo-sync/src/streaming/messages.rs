//! Topic routing between the wire and the relay.
//!
//! Inbound frames are decoded into [`Inbound`] by topic name; relay output
//! ([`Outbound`]) is mapped back to its configured topic and queued on the
//! publisher. Topic names come from [`TopicConfig`].

use crate::config::TopicConfig;
use crate::core::types::{CameraInfo, Image, OdometryRecord, TfMessage, VelocityMessage};
use crate::error::Result;
use crate::streaming::tcp_publisher::PublisherHandle;
use crate::streaming::wire::Serializer;

/// Camera of the stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Decoded record from a producer.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Image(Side, Image),
    CameraInfo(Side, CameraInfo),
    Velocity(VelocityMessage),
}

/// Record produced by the relay for subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Image(Side, Image),
    CameraInfo(Side, CameraInfo),
    Transforms(TfMessage),
    Odometry(OdometryRecord),
}

/// Maps topic names to message types in both directions.
#[derive(Debug, Clone, Default)]
pub struct TopicRouter {
    topics: TopicConfig,
}

impl TopicRouter {
    pub fn new(topics: TopicConfig) -> Self {
        Self { topics }
    }

    /// Decode `payload` according to the message type bound to `topic`.
    ///
    /// Unknown topics yield `Ok(None)`; a known topic with an undecodable
    /// payload is an error.
    pub fn decode(
        &self,
        topic: &str,
        payload: &[u8],
        serializer: &Serializer,
    ) -> Result<Option<Inbound>> {
        let t = &self.topics;
        let inbound = if topic == t.right_image_in {
            Inbound::Image(Side::Right, serializer.deserialize(payload)?)
        } else if topic == t.left_image_in {
            Inbound::Image(Side::Left, serializer.deserialize(payload)?)
        } else if topic == t.right_camera_info_in {
            Inbound::CameraInfo(Side::Right, serializer.deserialize(payload)?)
        } else if topic == t.left_camera_info_in {
            Inbound::CameraInfo(Side::Left, serializer.deserialize(payload)?)
        } else if topic == t.velocity_in {
            Inbound::Velocity(serializer.deserialize(payload)?)
        } else {
            log::debug!("Ignoring frame on unknown topic {}", topic);
            return Ok(None);
        };
        Ok(Some(inbound))
    }

    /// Configured topic for an outbound record.
    pub fn topic_for(&self, message: &Outbound) -> &str {
        let t = &self.topics;
        match message {
            Outbound::Image(Side::Left, _) => &t.left_image_out,
            Outbound::Image(Side::Right, _) => &t.right_image_out,
            Outbound::CameraInfo(Side::Left, _) => &t.left_camera_info_out,
            Outbound::CameraInfo(Side::Right, _) => &t.right_camera_info_out,
            Outbound::Transforms(_) => &t.tf_out,
            Outbound::Odometry(_) => &t.odometry_out,
        }
    }

    /// Queue `message` on its topic. Only the inner record goes on the wire.
    pub fn publish(&self, message: &Outbound, publisher: &PublisherHandle) -> Result<()> {
        let topic = self.topic_for(message);
        match message {
            Outbound::Image(_, image) => publisher.publish(topic, image),
            Outbound::CameraInfo(_, info) => publisher.publish(topic, info),
            Outbound::Transforms(tf) => publisher.publish(topic, tf),
            Outbound::Odometry(odom) => publisher.publish(topic, odom),
        }
    }
}
