use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, error, info};
use unipipe_frame::MAX_PAYLOAD_BYTES;

use crate::cancel::Cancel;
use crate::config::EndpointConfig;
use crate::error::{EndpointError, Result};
use crate::message::Message;
use crate::queue::SendQueue;

/// Which side of the bridge this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dials the pipe, retrying until a server is listening.
    Client,
    /// Listens on the pipe, one peer at a time.
    Server,
}

/// Notification delivered to endpoint subscribers.
///
/// Events arrive on plain channels that the host drains from its own loop,
/// so consumer-visible callbacks never run concurrently with host logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    /// A peer connected. Emitted once per successful accept, server side only.
    Connected,
    /// One decoded inbound message, raw wire text.
    Data(String),
}

/// Per-instance fan-out list of event subscribers.
///
/// A message arriving with no live subscriber is silently dropped.
pub(crate) struct Subscribers {
    senders: Mutex<Vec<Sender<EndpointEvent>>>,
}

impl Subscribers {
    fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    fn subscribe(&self) -> Receiver<EndpointEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().push(tx);
        rx
    }

    pub(crate) fn publish(&self, event: EndpointEvent) {
        // Dropped receivers are pruned as a side effect of delivery.
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<EndpointEvent>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared between the public API and the supervisor's loops.
pub(crate) struct Shared {
    pub(crate) role: Role,
    pub(crate) config: EndpointConfig,
    pub(crate) queue: SendQueue,
    pub(crate) cancel: Cancel,
    pub(crate) subscribers: Subscribers,
    connected: AtomicBool,
    #[cfg(unix)]
    active: Mutex<Option<Arc<crate::session::SessionGuard>>>,
}

impl Shared {
    #[cfg(unix)]
    fn set_active(&self, guard: Option<Arc<crate::session::SessionGuard>>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = guard;
    }

    #[cfg(unix)]
    fn close_active(&self) {
        let guard = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(guard) = guard {
            guard.close();
        }
    }
}

/// One client or server instance of the bridge.
///
/// Owns a background supervisor task that connects, runs one session at a
/// time, and reconnects forever until [`Endpoint::shutdown`]. Nothing this
/// endpoint does ever panics or errors into the host: `send` answers with a
/// `bool` and everything else is events and logs.
pub struct Endpoint {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl Endpoint {
    /// Create a client endpoint. Call [`Endpoint::start`] to begin dialing.
    pub fn client(config: EndpointConfig) -> Self {
        Self::with_role(Role::Client, config)
    }

    /// Create a server endpoint. Call [`Endpoint::start`] to begin listening.
    pub fn server(config: EndpointConfig) -> Self {
        Self::with_role(Role::Server, config)
    }

    fn with_role(role: Role, config: EndpointConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                role,
                config,
                queue: SendQueue::new(),
                cancel: Cancel::new(),
                subscribers: Subscribers::new(),
                connected: AtomicBool::new(false),
                #[cfg(unix)]
                active: Mutex::new(None),
            }),
            supervisor: Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Spawn the background supervisor. Valid exactly once per endpoint.
    #[cfg(unix)]
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(EndpointError::AlreadyStarted);
        }

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("unipipe-supervisor".into())
            .spawn(move || supervisor_loop(&shared))?;

        *self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Local pipes are unavailable here; permanent failure, no retry.
    #[cfg(not(unix))]
    pub fn start(&self) -> Result<()> {
        error!(role = ?self.shared.role, "pipe transport unavailable on this platform");
        Err(EndpointError::PlatformUnsupported)
    }

    /// Queue one serialized message for the peer.
    ///
    /// Returns `false` when the payload exceeds the 4096-byte frame limit
    /// or the platform has no pipe transport (never queued). Empty input is
    /// a no-op success. Acceptance is not delivery: messages still queued
    /// when a session dies are dropped.
    pub fn send(&self, msg: &str) -> bool {
        if msg.is_empty() {
            return true;
        }
        self.enqueue(msg)
    }

    #[cfg(unix)]
    fn enqueue(&self, msg: &str) -> bool {
        let bytes = msg.len();
        if bytes > MAX_PAYLOAD_BYTES {
            error!(
                bytes,
                max = MAX_PAYLOAD_BYTES,
                "send rejected, payload exceeds frame limit"
            );
            return false;
        }

        self.shared.queue.push(msg.to_string());
        if self.shared.config.verbose {
            debug!(bytes, "message enqueued");
        }
        true
    }

    /// No session can ever drain the queue here; refuse instead of growing it.
    #[cfg(not(unix))]
    fn enqueue(&self, _msg: &str) -> bool {
        error!("pipe transport unavailable on this platform, message dropped");
        false
    }

    /// Serialize and queue a typed message.
    pub fn send_message(&self, msg: &Message) -> bool {
        match msg.to_json() {
            Ok(json) => self.send(&json),
            Err(err) => {
                error!(%err, "message serialization failed");
                false
            }
        }
    }

    /// Subscribe to this endpoint's events. Each subscriber gets every
    /// event from subscription time on; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<EndpointEvent> {
        self.shared.subscribers.subscribe()
    }

    /// Whether a session is currently live.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Messages accepted but not yet written to the wire.
    pub fn pending_messages(&self) -> usize {
        self.shared.queue.len()
    }

    /// The configuration this endpoint runs with.
    pub fn config(&self) -> &EndpointConfig {
        &self.shared.config
    }

    /// Stop the endpoint: cancel the supervisor, close any live session,
    /// wait for the background work to finish. Idempotent; concurrent calls
    /// result in exactly one teardown.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(role = ?self.shared.role, "endpoint shutting down");

        self.shared.cancel.cancel();
        #[cfg(unix)]
        self.shared.close_active();

        let handle = self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("supervisor thread panicked");
            }
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// `Idle → Connecting → Active → Idle (retry) → … → Stopped`, one session
/// at a time, forever until cancelled.
#[cfg(unix)]
fn supervisor_loop(shared: &Arc<Shared>) {
    use crate::session::{run_session, SessionGuard};
    use crate::strategy::ConnectStrategy;

    let strategy = match shared.role {
        Role::Client => ConnectStrategy::Client,
        Role::Server => ConnectStrategy::Server,
    };
    debug!(role = ?shared.role, pipe = %shared.config.pipe_name, "supervisor started");

    while !shared.cancel.is_cancelled() {
        let Some(stream) = strategy.connect(&shared.config, &shared.cancel) else {
            break;
        };
        info!(role = ?shared.role, "pipe connected");

        let guard = match stream.try_clone() {
            Ok(control) => SessionGuard::new(control),
            Err(err) => {
                tracing::warn!(%err, "session setup failed");
                drop(stream);
                if shared.cancel.wait_timeout(shared.config.retry_backoff) {
                    break;
                }
                continue;
            }
        };

        // Messages queued against the dead connection do not leak into the
        // fresh session.
        shared.queue.clear();
        shared.set_active(Some(Arc::clone(&guard)));
        shared.connected.store(true, Ordering::SeqCst);

        if shared.role == Role::Server {
            shared.subscribers.publish(EndpointEvent::Connected);
        }

        run_session(stream, guard, Arc::clone(shared));

        shared.connected.store(false, Ordering::SeqCst);
        shared.set_active(None);
        shared.queue.clear();
        debug!(role = ?shared.role, "session ended");

        if shared.cancel.wait_timeout(shared.config.retry_backoff) {
            break;
        }
    }

    debug!(role = ?shared.role, "supervisor stopped");
}
