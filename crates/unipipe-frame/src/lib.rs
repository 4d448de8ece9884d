//! Message framing for the unipipe bridge.
//!
//! One frame is one UTF-8 text message terminated by a single `\n`.
//! Payloads are newline-free JSON, so the delimiter is unambiguous and no
//! length prefix is needed — the same bytes the host's message-mode pipe
//! writer puts on the wire. Frames are capped at 4096 payload bytes.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, DELIMITER, MAX_PAYLOAD_BYTES};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
