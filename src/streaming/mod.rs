//! Network transports for DishaIO
//!
//! - [`udp_publisher`]: [`ResultSink`](crate::core::sink::ResultSink) over UDP datagrams
//! - [`admin`]: TCP endpoint for reset-filter requests
//! - [`wire`]: JSON/Postcard serialization with length-prefixed framing
//! - [`messages`]: Wire records

pub mod admin;
pub mod messages;
pub mod udp_publisher;
pub mod wire;

pub use admin::AdminServer;
pub use messages::{Message, Payload};
pub use udp_publisher::{UdpPublisher, UdpTarget};
pub use wire::{Serializer, WireFormat};
