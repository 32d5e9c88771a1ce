//! Wire format serialization and framing
//!
//! Every message on the wire, UDP datagram or TCP admin exchange, is
//! length-prefixed:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON or Postcard binary  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **JSON** (default): human-readable, for debugging and cross-language clients
//! - **Postcard**: compact binary for bandwidth-constrained links
//!
//! Frames larger than [`MAX_MESSAGE_SIZE`] are rejected on read.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Maximum accepted payload size (1 MB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Serializer for the configured wire format
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn serialize<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Serialize `msg` into `buffer` as one length-prefixed frame
    ///
    /// The buffer is cleared first so callers can reuse it across messages.
    pub fn encode_frame<T: Serialize>(&self, msg: &T, buffer: &mut Vec<u8>) -> Result<()> {
        let payload = self.serialize(msg)?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(Error::Serialization(format!(
                "Message too large: {} bytes",
                payload.len()
            )));
        }
        buffer.clear();
        buffer.reserve(4 + payload.len());
        buffer.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buffer.extend_from_slice(&payload);
        Ok(())
    }

    /// Decode one complete frame held in memory (e.g. a UDP datagram)
    pub fn decode_frame<T: DeserializeOwned>(&self, frame: &[u8]) -> Result<T> {
        let (len_bytes, payload) = frame
            .split_first_chunk::<4>()
            .ok_or_else(|| Error::Serialization("Frame shorter than length prefix".to_string()))?;
        let len = u32::from_be_bytes(*len_bytes) as usize;
        if len != payload.len() {
            return Err(Error::Serialization(format!(
                "Length prefix {} does not match payload of {} bytes",
                len,
                payload.len()
            )));
        }
        self.deserialize(payload)
    }

    /// Write `msg` to a stream as one frame
    pub fn write_message<T: Serialize, W: Write>(&self, writer: &mut W, msg: &T) -> Result<()> {
        let mut buffer = Vec::new();
        self.encode_frame(msg, &mut buffer)?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        Ok(())
    }

    /// Read one frame from a stream, reusing `buffer` for the payload
    pub fn read_message<T: DeserializeOwned, R: Read>(
        &self,
        reader: &mut R,
        buffer: &mut Vec<u8>,
    ) -> Result<T> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(Error::Other(format!("Message too large: {} bytes", len)));
        }

        buffer.clear();
        buffer.resize(len, 0);
        reader.read_exact(buffer)?;
        self.deserialize(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::admin::AdminRequest;
    use std::io::Cursor;

    #[test]
    fn test_frame_layout() {
        let serializer = Serializer::new(WireFormat::Json);
        let mut buffer = Vec::new();
        serializer
            .encode_frame(&AdminRequest::ResetFilter, &mut buffer)
            .unwrap();

        let payload = br#""ResetFilter""#;
        assert_eq!(&buffer[..4], &(payload.len() as u32).to_be_bytes());
        assert_eq!(&buffer[4..], payload);
    }

    #[test]
    fn test_stream_round_trip_postcard() {
        let serializer = Serializer::new(WireFormat::Postcard);
        let mut stream = Vec::new();
        serializer
            .write_message(&mut stream, &AdminRequest::ResetFilter)
            .unwrap();

        let mut buffer = Vec::new();
        let request: AdminRequest = serializer
            .read_message(&mut Cursor::new(stream), &mut buffer)
            .unwrap();
        assert_eq!(request, AdminRequest::ResetFilter);
    }

    #[test]
    fn test_oversized_length_rejected() {
        let serializer = Serializer::new(WireFormat::Json);
        let mut data = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
        data.extend_from_slice(b"{}");

        let mut buffer = Vec::new();
        let result: Result<AdminRequest> =
            serializer.read_message(&mut Cursor::new(data), &mut buffer);
        assert!(matches!(result, Err(Error::Other(_))));
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let serializer = Serializer::new(WireFormat::Json);
        let result: Result<AdminRequest> = serializer.decode_frame(&[0, 0, 0, 9, b'"']);
        assert!(matches!(result, Err(Error::Serialization(_))));
        let result: Result<AdminRequest> = serializer.decode_frame(&[0, 0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_wire_format_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: WireFormat,
        }
        let w: Wrapper = toml::from_str("format = \"postcard\"").unwrap();
        assert_eq!(w.format, WireFormat::Postcard);
        assert_eq!(WireFormat::default(), WireFormat::Json);
    }
}
