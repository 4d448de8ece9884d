use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::PipeStream;
use crate::uds::PipeListener;

/// How often an in-flight dial wakes to check for cancellation.
const CANCEL_POLL_SLICE: Duration = Duration::from_millis(100);

/// Dial a listening pipe, bounded by `timeout`.
///
/// The socket is connected in non-blocking mode and completion is awaited
/// with `poll(2)`, so a dial never parks the caller longer than the given
/// bound. On success the stream is switched back to blocking mode.
pub fn connect_timeout(path: impl AsRef<Path>, timeout: Duration) -> Result<PipeStream> {
    connect_cancellable(path, timeout, || false)
}

/// [`connect_timeout`] that additionally abandons the dial when `cancelled`
/// answers `true`, checked every [`CANCEL_POLL_SLICE`] while waiting.
///
/// Abandonment surfaces as [`TransportError::Cancelled`], not a failure.
pub fn connect_cancellable(
    path: impl AsRef<Path>,
    timeout: Duration,
    mut cancelled: impl FnMut() -> bool,
) -> Result<PipeStream> {
    let path = path.as_ref();

    if cancelled() {
        return Err(TransportError::Cancelled);
    }

    let path_bytes = path.as_os_str().as_bytes();
    if path_bytes.len() >= PipeListener::MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len: path_bytes.len(),
            max: PipeListener::MAX_PATH_LEN,
        });
    }

    let fd = nonblocking_unix_socket().map_err(|e| TransportError::Connect {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
    for (dst, src) in addr.sun_path.iter_mut().zip(path_bytes) {
        *dst = *src as libc::c_char;
    }
    let addr_len =
        (std::mem::size_of::<libc::sa_family_t>() + path_bytes.len() + 1) as libc::socklen_t;

    // SAFETY: `addr` is a fully initialized sockaddr_un and `addr_len` covers
    // the family field plus the NUL-terminated path written above.
    let rc = unsafe {
        libc::connect(
            fd.as_raw_fd(),
            (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
            addr_len,
        )
    };

    if rc != 0 {
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINPROGRESS) | Some(libc::EAGAIN) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if cancelled() {
                        return Err(TransportError::Cancelled);
                    }
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(TransportError::ConnectTimeout {
                            path: path.to_path_buf(),
                            timeout,
                        });
                    }
                    if poll_fd(
                        fd.as_raw_fd(),
                        libc::POLLOUT,
                        remaining.min(CANCEL_POLL_SLICE),
                    )? {
                        break;
                    }
                }
                if let Some(err) = take_socket_error(fd.as_raw_fd()) {
                    return Err(TransportError::Connect {
                        path: path.to_path_buf(),
                        source: err,
                    });
                }
            }
            _ => {
                return Err(TransportError::Connect {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    set_blocking(fd.as_raw_fd()).map_err(|e| TransportError::Connect {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(?path, "pipe dial complete");
    Ok(PipeStream::from_unix(UnixStream::from(fd)))
}

/// Wait for `events` on `fd`, up to `timeout`. Returns whether the fd became
/// ready. `EINTR` restarts the wait with the remaining time.
pub(crate) fn poll_fd(fd: RawFd, events: libc::c_short, timeout: Duration) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let millis = remaining.as_millis().min(i32::MAX as u128) as libc::c_int;

        let mut pfd = libc::pollfd {
            fd,
            events,
            revents: 0,
        };
        // SAFETY: `pfd` is a valid pollfd for the duration of the call and
        // `fd` is an open descriptor owned by this process.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };

        if rc > 0 {
            return Ok(true);
        }
        if rc == 0 {
            return Ok(false);
        }

        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err.into());
    }
}

fn nonblocking_unix_socket() -> std::io::Result<OwnedFd> {
    // SAFETY: plain socket(2) call; the raw fd is transferred into OwnedFd
    // immediately so it cannot leak on the error paths below.
    let raw = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) };
    if raw < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    // SAFETY: fcntl on an fd we own.
    unsafe {
        if libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) < 0 {
            return Err(std::io::Error::last_os_error());
        }
        let flags = libc::fcntl(fd.as_raw_fd(), libc::F_GETFL);
        if flags < 0 || libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(fd)
}

fn set_blocking(fd: RawFd) -> std::io::Result<()> {
    // SAFETY: fcntl on an fd we own.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

fn take_socket_error(fd: RawFd) -> Option<std::io::Error> {
    let mut err: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;

    // SAFETY: `err` and `len` are valid writable pointers for the provided
    // sizes, and `fd` is an open socket descriptor owned by this process.
    let rc = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            (&mut err as *mut libc::c_int).cast::<libc::c_void>(),
            &mut len,
        )
    };

    if rc != 0 {
        return Some(std::io::Error::last_os_error());
    }
    if err != 0 {
        return Some(std::io::Error::from_raw_os_error(err));
    }
    None
}
