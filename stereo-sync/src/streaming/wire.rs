//! Wire format serialization and framing
//!
//! # TCP Protocol Specification
//!
//! Both directions (producers → relay, relay → subscribers) use the same
//! topic-tagged, length-prefixed framing:
//!
//! ```text
//! ┌──────────────────┬─────────────────┬──────┬──────────────────────────┐
//! │ Length (4 bytes) │ Topic (UTF-8)   │ 0x00 │ Payload (variable)       │
//! │ Big-endian u32   │                 │      │ JSON or Postcard binary  │
//! └──────────────────┴─────────────────┴──────┴──────────────────────────┘
//! ```
//!
//! - **Length field**: counts topic + terminator + payload
//! - **Maximum frame size**: 16 MiB (a raw stereo image is well below this)
//! - **Topic**: routes the payload to a message type; never empty
//!
//! ## Wire Formats
//!
//! ### JSON (Default)
//! Human-readable, easy to inspect with `nc`; larger on the wire.
//!
//! ### Postcard (Binary)
//! Compact and fast; both ends must share the message definitions.
//!
//! ## Error Handling
//!
//! - **Oversized frame**: connection closed
//! - **Producer stalls mid-frame for longer than [`STALL_TIMEOUT`]**: read
//!   fails with `TimedOut`, connection closed
//! - **Missing topic terminator / bad UTF-8**: connection closed
//! - **Payload deserialization failure**: frame logged and discarded by the
//!   handler, connection remains open

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

/// Maximum accepted frame length in bytes
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Longest a started frame may go without receiving another byte
pub const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Serializer for either wire format
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    /// Create a new serializer for the given format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Serialize a message to bytes
    pub fn serialize<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => Ok(postcard::to_allocvec(msg)?),
            WireFormat::Json => Ok(serde_json::to_vec(msg)?),
        }
    }

    /// Deserialize bytes to a message
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self.format {
            WireFormat::Postcard => Ok(postcard::from_bytes(bytes)?),
            WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

/// Create a serializer for the given wire format
pub fn create_serializer(format: WireFormat) -> Serializer {
    Serializer::new(format)
}

/// One decoded frame, borrowing from the receive buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
}

/// Append a complete frame for `topic` + `payload` to `buffer`.
///
/// `buffer` is cleared first so callers can reuse one allocation.
pub fn encode_frame(topic: &str, payload: &[u8], buffer: &mut Vec<u8>) -> Result<()> {
    if topic.is_empty() || topic.as_bytes().contains(&0) {
        return Err(Error::MalformedFrame(format!("invalid topic {:?}", topic)));
    }

    let frame_length = topic.len() + 1 + payload.len();
    if frame_length > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            size: frame_length,
            max: MAX_FRAME_SIZE,
        });
    }

    buffer.clear();
    buffer.reserve(4 + frame_length);
    buffer.extend_from_slice(&(frame_length as u32).to_be_bytes());
    buffer.extend_from_slice(topic.as_bytes());
    buffer.push(0);
    buffer.extend_from_slice(payload);
    Ok(())
}

/// Read one frame from `reader` into `buffer`.
///
/// Returns `Ok(None)` if the read timed out before the first byte of a frame
/// arrived, so the caller can check its shutdown flag. Once a frame has
/// started, timeouts are retried until no byte has arrived for
/// [`STALL_TIMEOUT`], after which the read fails with `TimedOut`.
pub fn read_frame<'a, R: Read>(
    reader: &mut R,
    buffer: &'a mut Vec<u8>,
) -> Result<Option<Frame<'a>>> {
    read_frame_within(reader, buffer, STALL_TIMEOUT)
}

fn read_frame_within<'a, R: Read>(
    reader: &mut R,
    buffer: &'a mut Vec<u8>,
    stall_timeout: Duration,
) -> Result<Option<Frame<'a>>> {
    let mut len_buf = [0u8; 4];
    if !fill(reader, &mut len_buf, true, stall_timeout)? {
        return Ok(None);
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    buffer.clear();
    buffer.resize(len, 0);
    fill(reader, buffer, false, stall_timeout)?;
    let data: &'a [u8] = buffer.as_slice();

    let split = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedFrame("missing topic terminator".to_string()))?;
    if split == 0 {
        return Err(Error::MalformedFrame("empty topic".to_string()));
    }

    let (topic, rest) = data.split_at(split);
    let topic = std::str::from_utf8(topic)
        .map_err(|e| Error::MalformedFrame(format!("topic is not UTF-8: {}", e)))?;

    Ok(Some(Frame {
        topic,
        payload: &rest[1..],
    }))
}

/// Fill `buf` completely. Returns `Ok(false)` only when `idle_ok` is set and
/// the read timed out before any byte arrived.
fn fill<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    idle_ok: bool,
    stall_timeout: Duration,
) -> Result<bool> {
    let mut filled = 0;
    let mut last_progress = Instant::now();
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::Io(ErrorKind::UnexpectedEof.into())),
            Ok(n) => {
                filled += n;
                last_progress = Instant::now();
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if filled == 0 && idle_ok {
                    return Ok(false);
                }
                if last_progress.elapsed() >= stall_timeout {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        format!("frame stalled after {} of {} bytes", filled, buf.len()),
                    )));
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(true)
}
