use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::dial::poll_fd;
use crate::error::{Result, TransportError};
use crate::stream::PipeStream;

/// Map a pipe name to a socket path on the local machine.
///
/// Names are placed under `$XDG_RUNTIME_DIR` when set, falling back to the
/// system temp directory, so both sides of the bridge agree on the location
/// by name alone.
pub fn pipe_path(name: &str) -> PathBuf {
    let dir = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    dir.join(format!("{name}.pipe"))
}

/// Listening end of a named pipe, single peer at a time.
///
/// Binds a Unix domain socket at the path derived from the pipe name. The
/// socket file is removed again when the listener is dropped, so a server
/// that re-creates its listener per connection leaves nothing stale behind.
pub struct PipeListener {
    listener: UnixListener,
    path: PathBuf,
    // (dev, ino) of the socket file this listener created; Drop removes the
    // path only while it still names that exact file.
    created_inode: (u64, u64),
}

impl PipeListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    pub(crate) const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    pub(crate) const MAX_PATH_LEN: usize = 104;

    /// Bind and listen at `path`.
    ///
    /// If the path already holds a socket it is assumed stale and removed
    /// first; any other existing file is an error. The created socket is
    /// restricted to the owning user.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        // Remove stale socket if it exists, but never remove non-socket files.
        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale pipe socket");
                std::fs::remove_file(&path).map_err(|e| TransportError::Bind {
                    path: path.clone(),
                    source: e,
                })?;
            } else {
                return Err(TransportError::Bind {
                    path: path.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
        }

        let listener = UnixListener::bind(&path).map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;
        listener.set_nonblocking(true).map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;

        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;

        let created_metadata =
            std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
        let created_inode = (created_metadata.dev(), created_metadata.ino());

        info!(?path, "pipe listening");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Wait up to `timeout` for a peer to connect.
    ///
    /// Returns `Ok(None)` when no peer arrived within the window, so callers
    /// can interleave cancellation checks with the wait.
    pub fn accept_timeout(&self, timeout: Duration) -> Result<Option<PipeStream>> {
        if !poll_fd(self.listener.as_raw_fd(), libc::POLLIN, timeout)? {
            return Ok(None);
        }
        match self.listener.accept() {
            Ok((stream, _addr)) => {
                stream.set_nonblocking(false).map_err(TransportError::Accept)?;
                debug!("accepted pipe peer");
                Ok(Some(PipeStream::from_unix(stream)))
            }
            // Raced with another accept or the peer gave up; let the caller poll again.
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The path this listener is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PipeListener {
    fn drop(&mut self) {
        let (expected_dev, expected_ino) = self.created_inode;
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up pipe socket");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}
