/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload contains the frame delimiter and cannot be framed.
    #[error("payload contains embedded newline delimiter")]
    EmbeddedDelimiter,

    /// A received frame is not valid UTF-8. Readers treat this the same as
    /// the peer vanishing mid-message.
    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether this error means the peer is simply gone — the expected end
    /// of a session rather than a fault.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            FrameError::ConnectionClosed | FrameError::InvalidUtf8(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
