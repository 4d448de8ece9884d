use std::path::PathBuf;
use std::time::Duration;

/// Default pipe name. Must match the host side's default for the two
/// processes to find each other without any configuration.
pub const DEFAULT_PIPE_NAME: &str = "UnityPipe";

/// Tunable parameters of one endpoint instance. All fields have defaults;
/// override with the `with_*` builders.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Name of the pipe both sides agree on.
    pub pipe_name: String,
    /// Explicit socket path; overrides the pipe-name mapping when set
    /// (tests, containers with private runtime dirs).
    pub socket_path: Option<PathBuf>,
    /// Hard per-attempt bound on a client dial.
    pub connect_timeout: Duration,
    /// Delay between a failed/ended connection attempt and the next retry.
    pub retry_backoff: Duration,
    /// Delay before a server rebinds after a listen/accept error.
    pub accept_retry_delay: Duration,
    /// How often the server's accept wait wakes to check cancellation.
    pub accept_poll: Duration,
    /// Wall-clock interval between heartbeat frames.
    pub heartbeat_interval: Duration,
    /// Writer loop throttle; bounds enqueue-to-wire latency.
    pub write_tick: Duration,
    /// Emit chatty per-message logs.
    pub verbose: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            pipe_name: DEFAULT_PIPE_NAME.to_string(),
            socket_path: None,
            connect_timeout: Duration::from_millis(1000),
            retry_backoff: Duration::from_millis(500),
            accept_retry_delay: Duration::from_millis(1000),
            accept_poll: Duration::from_millis(100),
            heartbeat_interval: Duration::from_secs(1),
            write_tick: Duration::from_millis(50),
            verbose: false,
        }
    }
}

impl EndpointConfig {
    /// Config for a named pipe, everything else default.
    pub fn named(pipe_name: impl Into<String>) -> Self {
        Self {
            pipe_name: pipe_name.into(),
            ..Self::default()
        }
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_write_tick(mut self, tick: Duration) -> Self {
        self.write_tick = tick;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The socket path this endpoint binds or dials.
    #[cfg(unix)]
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| unipipe_transport::pipe_path(&self.pipe_name))
    }
}
