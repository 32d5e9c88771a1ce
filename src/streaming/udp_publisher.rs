//! UDP publisher for transformed outputs
//!
//! Implements [`ResultSink`] over a fixed list of unicast targets from the
//! configuration. Each target subscribes to a set of topics; the consumer
//! count of a topic is the number of targets subscribed to it, so the
//! acquisition loop skips transforms nobody receives.
//!
//! # Wire Format
//!
//! One datagram per output per target, same framing as the admin channel:
//!
//! ```text
//! ┌──────────────────┬──────────────────────┐
//! │ Length (4 bytes) │ Message              │
//! │ Big-endian u32   │ (JSON or Postcard)   │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! Send errors are logged and never fail the tick: UDP delivery is
//! fire-and-forget.

use crate::config::{StreamingConfig, TargetConfig};
use crate::core::sink::{Output, ResultSink, Topic};
use crate::error::{Error, Result};
use crate::streaming::messages::Message;
use crate::streaming::wire::Serializer;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Typical IMU message is well under 1 KB in JSON
const INITIAL_BUFFER_CAPACITY: usize = 2048;

/// One configured datagram destination
#[derive(Debug, Clone)]
pub struct UdpTarget {
    pub address: SocketAddr,
    pub topics: Vec<Topic>,
}

impl UdpTarget {
    pub fn from_config(config: &TargetConfig) -> Result<Self> {
        let address = config
            .address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                Error::Config(format!("Target address {} did not resolve", config.address))
            })?;
        Ok(Self {
            address,
            topics: config.topics.clone(),
        })
    }

    fn wants(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }
}

/// Publishes outputs as UDP datagrams
pub struct UdpPublisher {
    socket: UdpSocket,
    serializer: Serializer,
    targets: Vec<UdpTarget>,
    send_buffer: Vec<u8>,
    sent: u64,
    send_errors: u64,
}

impl UdpPublisher {
    pub fn new(socket: UdpSocket, serializer: Serializer, targets: Vec<UdpTarget>) -> Self {
        Self {
            socket,
            serializer,
            targets,
            send_buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            sent: 0,
            send_errors: 0,
        }
    }

    /// Bind an ephemeral socket (we only send) and resolve configured targets
    pub fn from_config(config: &StreamingConfig) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| Error::Other(format!("Failed to create UDP socket: {}", e)))?;

        let targets = config
            .targets
            .iter()
            .map(UdpTarget::from_config)
            .collect::<Result<Vec<_>>>()?;

        for target in &targets {
            let names: Vec<&str> = target.topics.iter().map(|t| t.name()).collect();
            log::info!("UDP streaming to {} ({})", target.address, names.join(", "));
        }
        if targets.is_empty() {
            log::warn!("No UDP targets configured, outputs will not be computed");
        }

        Ok(Self::new(
            socket,
            Serializer::new(config.wire_format),
            targets,
        ))
    }

    pub fn targets(&self) -> &[UdpTarget] {
        &self.targets
    }

    /// Datagrams sent successfully
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors
    }
}

impl ResultSink for UdpPublisher {
    fn subscriber_count(&self, topic: Topic) -> usize {
        self.targets.iter().filter(|t| t.wants(topic)).count()
    }

    fn publish(&mut self, output: Output) -> Result<()> {
        let topic = output.topic();
        let message = Message::from(&output);
        self.serializer.encode_frame(&message, &mut self.send_buffer)?;

        for target in self.targets.iter().filter(|t| t.wants(topic)) {
            match self.socket.send_to(&self.send_buffer, target.address) {
                Ok(_) => {
                    self.sent += 1;
                    log::trace!("Sent {} to {}", topic.name(), target.address);
                }
                Err(e) => {
                    // UDP send errors are not fatal - just log and continue
                    self.send_errors += 1;
                    log::warn!("Failed to send {} to {}: {}", topic.name(), target.address, e);
                }
            }
        }
        Ok(())
    }
}
