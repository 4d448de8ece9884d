use std::path::PathBuf;

/// Errors that can occur in pipe transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the listening endpoint.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the named pipe.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The dial did not complete within the allowed time.
    #[error("connect to {path} timed out after {timeout:?}")]
    ConnectTimeout {
        path: PathBuf,
        timeout: std::time::Duration,
    },

    /// The dial was abandoned because the caller cancelled it.
    #[error("connect cancelled")]
    Cancelled,

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Local pipes are not available on this platform.
    #[error("pipe transport is not supported on this platform")]
    PlatformUnsupported,
}

pub type Result<T> = std::result::Result<T, TransportError>;
