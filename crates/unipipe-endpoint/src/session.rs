use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, error, warn};
use unipipe_frame::{FrameError, FrameReader, FrameWriter};
use unipipe_transport::PipeStream;

use crate::endpoint::{EndpointEvent, Shared};
use crate::message::Message;

/// Scope of one connected-transport lifetime.
///
/// Either loop exiting, or an endpoint-level shutdown, closes the guard:
/// the first close shuts the transport down so the *other* loop's blocking
/// read or write unwinds promptly; every later close is a no-op.
pub(crate) struct SessionGuard {
    closed: AtomicBool,
    stream: Mutex<Option<PipeStream>>,
}

impl SessionGuard {
    pub(crate) fn new(control: PipeStream) -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            stream: Mutex::new(Some(control)),
        })
    }

    /// End the session. First caller wins and closes the transport.
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stream) = stream {
            let _ = stream.shutdown();
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Run one session to completion: reader and writer loops concurrently,
/// joined once both have unwound. Never panics outward; every failure is a
/// log plus loop exit.
pub(crate) fn run_session(stream: PipeStream, guard: Arc<SessionGuard>, shared: Arc<Shared>) {
    let reader_stream = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            warn!(%err, "could not split session stream");
            guard.close();
            return;
        }
    };

    let reader = {
        let guard = Arc::clone(&guard);
        let shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("unipipe-reader".into())
            .spawn(move || reader_loop(reader_stream, &guard, &shared))
    };
    let reader = match reader {
        Ok(handle) => handle,
        Err(err) => {
            error!(%err, "failed to spawn reader loop");
            guard.close();
            return;
        }
    };

    let writer = {
        let guard = Arc::clone(&guard);
        let shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("unipipe-writer".into())
            .spawn(move || writer_loop(stream, &guard, &shared))
    };
    match writer {
        Ok(handle) => {
            if handle.join().is_err() {
                error!("writer loop panicked");
            }
        }
        Err(err) => {
            error!(%err, "failed to spawn writer loop");
            guard.close();
        }
    }

    if reader.join().is_err() {
        error!("reader loop panicked");
    }
}

/// Drain inbound frames and republish them to subscribers until the peer
/// closes, an I/O error surfaces, or the session is cancelled.
fn reader_loop(stream: PipeStream, guard: &SessionGuard, shared: &Shared) {
    let mut reader = FrameReader::new(stream);

    loop {
        if guard.is_closed() || shared.cancel.is_cancelled() {
            break;
        }

        match reader.read_frame() {
            Ok(payload) => {
                if shared.config.verbose {
                    debug!(bytes = payload.len(), %payload, "frame received");
                }
                shared.subscribers.publish(EndpointEvent::Data(payload));
            }
            Err(err) if err.is_disconnect() => {
                debug!("peer closed the pipe");
                break;
            }
            Err(FrameError::Io(err)) => {
                // Expected when the other side leaves or the session is torn
                // down under us; ordinary disconnect signal either way.
                if !guard.is_closed() {
                    debug!(%err, "pipe read ended");
                }
                break;
            }
            Err(err) => {
                error!(%err, "reader loop error");
                break;
            }
        }
    }

    guard.close();
}

/// Drain the outbound queue onto the transport in FIFO order, inject a
/// heartbeat when its interval elapses, throttle, repeat.
fn writer_loop(stream: PipeStream, guard: &SessionGuard, shared: &Shared) {
    let mut writer = FrameWriter::new(stream);
    let started = Instant::now();
    // Next-deadline accumulation: a slow iteration delays a heartbeat by at
    // most one tick, it does not shift the whole cadence.
    let mut next_beat = shared.config.heartbeat_interval;

    'session: loop {
        if guard.is_closed() || shared.cancel.is_cancelled() {
            break;
        }

        while let Some(msg) = shared.queue.pop() {
            match writer.send(&msg) {
                Ok(()) => {
                    if shared.config.verbose {
                        debug!(%msg, "frame sent");
                    }
                }
                Err(err) => {
                    log_write_end(&err, guard);
                    break 'session;
                }
            }
        }

        if started.elapsed() >= next_beat {
            match Message::heartbeat().to_json() {
                Ok(json) => {
                    if let Err(err) = writer.send(&json) {
                        log_write_end(&err, guard);
                        break 'session;
                    }
                    if shared.config.verbose {
                        debug!("heartbeat sent");
                    }
                }
                Err(err) => error!(%err, "heartbeat serialization failed"),
            }
            next_beat += shared.config.heartbeat_interval;
        }

        if shared.cancel.wait_timeout(shared.config.write_tick) {
            break;
        }
    }

    guard.close();
}

fn log_write_end(err: &FrameError, guard: &SessionGuard) {
    if guard.is_closed() || err.is_disconnect() || matches!(err, FrameError::Io(_)) {
        debug!(%err, "pipe write ended");
    } else {
        error!(%err, "writer loop error");
    }
}
