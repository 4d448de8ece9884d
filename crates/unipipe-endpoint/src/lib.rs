//! Reconnecting endpoints for the unipipe bridge.
//!
//! This is the "just works" layer. An [`Endpoint`] owns one background
//! supervisor that connects (as client or server), runs concurrent reader
//! and writer loops over the live pipe, heartbeats the peer, and loops back
//! to reconnect whenever the session dies. Collaborators only ever touch
//! [`Endpoint::send`] and the event receivers handed out by
//! [`Endpoint::subscribe`].

pub mod cancel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod queue;

#[cfg(unix)]
pub(crate) mod session;
#[cfg(unix)]
pub(crate) mod strategy;

pub use cancel::Cancel;
pub use config::EndpointConfig;
pub use endpoint::{Endpoint, EndpointEvent, Role};
pub use error::{EndpointError, Result};
pub use message::{
    Message, KIND_CUSTOM, KIND_HEARTBEAT, KIND_HIDE_WINDOW, KIND_SHOW_WINDOW,
};
pub use queue::SendQueue;
