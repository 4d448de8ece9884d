//! Local duplex transport for the unipipe bridge.
//!
//! Provides a named, local-machine-scoped channel between a host application
//! and its companion process:
//! - Unix domain sockets (Linux/macOS), with pipe names mapped to socket
//!   paths under the runtime directory
//! - other platforms report [`TransportError::PlatformUnsupported`]
//!
//! This is the lowest layer of unipipe. Everything else builds on top of
//! the [`PipeStream`] type provided here.

pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod dial;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::PipeStream;

#[cfg(unix)]
pub use dial::{connect_cancellable, connect_timeout};
#[cfg(unix)]
pub use uds::{pipe_path, PipeListener};
