//! Duplex message bridge over local named pipes.
//!
//! unipipe bridges a host application and a companion process over an
//! OS-local pipe: newline-delimited JSON messages, automatic reconnection,
//! and heartbeat liveness, with symmetric client and server endpoints.
//!
//! # Crate Structure
//!
//! - [`transport`] — Local pipe transport (Unix domain sockets)
//! - [`frame`] — Newline-delimited message framing
//! - [`endpoint`] — Reconnecting client/server endpoints (behind the
//!   `endpoint` feature, on by default)

/// Re-export transport types.
pub mod transport {
    pub use unipipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use unipipe_frame::*;
}

/// Re-export endpoint types (requires `endpoint` feature).
#[cfg(feature = "endpoint")]
pub mod endpoint {
    pub use unipipe_endpoint::*;
}
