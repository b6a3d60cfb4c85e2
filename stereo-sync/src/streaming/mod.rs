//! TCP streaming module for stereo-sync

pub mod messages;
pub mod tcp_publisher;
pub mod tcp_receiver;
pub mod wire;

pub use messages::{Inbound, Outbound, Side, TopicRouter};
pub use tcp_publisher::{PublisherHandle, TcpPublisher};
pub use tcp_receiver::{FrameHandler, TcpReceiver, accept_loop};
pub use wire::{
    Frame, MAX_FRAME_SIZE, Serializer, WireFormat, create_serializer, encode_frame, read_frame,
};
