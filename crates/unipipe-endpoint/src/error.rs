/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] unipipe_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] unipipe_frame::FrameError),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error outside the transport itself (thread spawn, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local pipes are not available on this platform. Permanent for this
    /// endpoint instance; the supervisor does not retry it.
    #[error("pipe transport is not supported on this platform")]
    PlatformUnsupported,

    /// `start` was called more than once.
    #[error("endpoint already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, EndpointError>;
