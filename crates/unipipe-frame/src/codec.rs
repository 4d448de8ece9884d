use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Maximum payload size per frame: 4 KiB, matching the host side's cap.
pub const MAX_PAYLOAD_BYTES: usize = 4096;

/// Frame delimiter. Payloads are newline-free JSON text, so a single `\n`
/// marks the end of exactly one message.
pub const DELIMITER: u8 = b'\n';

/// Encode one message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────────────────────────┬──────────┐
/// │ UTF-8 payload (≤ 4096 bytes)  │ '\n'     │
/// └───────────────────────────────┴──────────┘
/// ```
pub fn encode_frame(payload: &str, dst: &mut BytesMut) -> Result<()> {
    let bytes = payload.as_bytes();
    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(FrameError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_PAYLOAD_BYTES,
        });
    }
    if bytes.contains(&DELIMITER) {
        return Err(FrameError::EmbeddedDelimiter);
    }
    dst.reserve(bytes.len() + 1);
    dst.put_slice(bytes);
    dst.put_u8(DELIMITER);
    Ok(())
}

/// Decode one message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes (including the delimiter) from the
/// buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<String>> {
    match src.iter().position(|&b| b == DELIMITER) {
        Some(pos) => {
            if pos > max_payload {
                return Err(FrameError::PayloadTooLarge {
                    size: pos,
                    max: max_payload,
                });
            }
            let mut frame = src.split_to(pos + 1);
            frame.truncate(pos); // drop the delimiter
            let payload = String::from_utf8(frame.to_vec())?;
            Ok(Some(payload))
        }
        None => {
            // A peer streaming more than a frame's worth of bytes without a
            // delimiter will never produce a valid message.
            if src.len() > max_payload {
                return Err(FrameError::PayloadTooLarge {
                    size: src.len(),
                    max: max_payload,
                });
            }
            Ok(None)
        }
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 4096.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_BYTES,
        }
    }
}
