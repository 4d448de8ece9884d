use tracing::{debug, warn};
use unipipe_transport::{connect_cancellable, PipeListener, PipeStream, TransportError};

use crate::cancel::Cancel;
use crate::config::EndpointConfig;

/// Role-specific logic for obtaining one connected transport.
///
/// Both variants retry internally forever; the only two ways out are a
/// connected stream or a cancellation request (`None`). Expected failures
/// (absent server, dial timeout, dropped listener) never escape as errors.
pub(crate) enum ConnectStrategy {
    /// Dial the pipe with a bounded timeout, back off, repeat.
    Client,
    /// Bind a fresh listener and wait for exactly one peer.
    Server,
}

impl ConnectStrategy {
    pub(crate) fn connect(&self, config: &EndpointConfig, cancel: &Cancel) -> Option<PipeStream> {
        match self {
            ConnectStrategy::Client => client_connect(config, cancel),
            ConnectStrategy::Server => server_connect(config, cancel),
        }
    }
}

fn client_connect(config: &EndpointConfig, cancel: &Cancel) -> Option<PipeStream> {
    let path = config.socket_path();
    loop {
        if cancel.is_cancelled() {
            return None;
        }

        match connect_cancellable(&path, config.connect_timeout, || cancel.is_cancelled()) {
            Ok(stream) => return Some(stream),
            Err(TransportError::Cancelled) => return None,
            Err(TransportError::ConnectTimeout { timeout, .. }) => {
                debug!(?path, ?timeout, "dial timed out, retrying");
            }
            Err(err) => {
                // Server absent or mid-restart.
                debug!(?path, %err, "dial failed, retrying");
            }
        }

        if cancel.wait_timeout(config.retry_backoff) {
            return None;
        }
    }
}

fn server_connect(config: &EndpointConfig, cancel: &Cancel) -> Option<PipeStream> {
    let path = config.socket_path();
    loop {
        if cancel.is_cancelled() {
            return None;
        }

        // Fresh listener per connection: its socket file disappears with it,
        // so an active session never advertises a listening endpoint.
        let listener = match PipeListener::bind(&path) {
            Ok(listener) => listener,
            Err(err) => {
                warn!(?path, %err, "pipe bind failed, retrying");
                if cancel.wait_timeout(config.accept_retry_delay) {
                    return None;
                }
                continue;
            }
        };

        loop {
            if cancel.is_cancelled() {
                return None;
            }
            match listener.accept_timeout(config.accept_poll) {
                Ok(Some(stream)) => return Some(stream),
                Ok(None) => continue,
                Err(err) => {
                    warn!(?path, %err, "accept failed, rebinding");
                    break;
                }
            }
        }

        if cancel.wait_timeout(config.accept_retry_delay) {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use super::*;

    fn temp_config(tag: &str) -> EndpointConfig {
        let dir = std::env::temp_dir().join(format!(
            "unipipe-strategy-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        EndpointConfig::named("StrategyTest")
            .with_socket_path(dir.join("bridge.pipe"))
            .with_retry_backoff(Duration::from_millis(20))
    }

    fn cleanup(config: &EndpointConfig) {
        if let Some(parent) = config.socket_path().parent().map(PathBuf::from) {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn client_gives_up_only_on_cancel() {
        // Dial bound far above the test bound: cancellation must cut through
        // an attempt instead of waiting it out.
        let config = temp_config("client-cancel").with_connect_timeout(Duration::from_secs(30));
        let cancel = Cancel::new();

        let waiter = cancel.clone();
        let dial_config = config.clone();
        let handle = std::thread::spawn(move || {
            // No server will ever appear; this must spin until cancelled.
            ConnectStrategy::Client.connect(&dial_config, &waiter)
        });

        std::thread::sleep(Duration::from_millis(150));
        cancel.cancel();
        let start = Instant::now();
        let result = handle.join().unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(2));
        cleanup(&config);
    }

    #[test]
    fn server_accepts_dialing_client() {
        let config = temp_config("server-accept");
        let cancel = Cancel::new();

        let accept_config = config.clone();
        let accept_cancel = cancel.clone();
        let server = std::thread::spawn(move || {
            ConnectStrategy::Server.connect(&accept_config, &accept_cancel)
        });

        let client = ConnectStrategy::Client.connect(&config, &cancel);
        assert!(client.is_some());
        assert!(server.join().unwrap().is_some());
        cleanup(&config);
    }

    #[test]
    fn server_unblocks_on_cancel_while_listening() {
        let config = temp_config("server-cancel");
        let cancel = Cancel::new();

        let accept_config = config.clone();
        let accept_cancel = cancel.clone();
        let server = std::thread::spawn(move || {
            ConnectStrategy::Server.connect(&accept_config, &accept_cancel)
        });

        std::thread::sleep(Duration::from_millis(100));
        cancel.cancel();
        assert!(server.join().unwrap().is_none());
        cleanup(&config);
    }
}
