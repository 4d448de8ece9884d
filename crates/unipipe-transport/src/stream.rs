use std::io::{Read, Write};

use crate::error::Result;

/// A connected duplex pipe stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// On Unix it wraps a Unix domain socket stream. The stream is exclusively
/// owned by one session; a clone obtained via [`PipeStream::try_clone`]
/// shares the same underlying connection so the reader and writer halves
/// can live on separate threads.
pub struct PipeStream {
    inner: PipeStreamInner,
}

enum PipeStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for PipeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for PipeStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl PipeStream {
    /// Create a PipeStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: PipeStreamInner::Unix(stream),
        }
    }

    /// Try to clone this stream (creates a new file descriptor for the
    /// same connection).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }

    /// Shut down both directions of the connection.
    ///
    /// Unblocks any thread parked in a read or write on this connection,
    /// including through clones of this stream. Calling it on an already
    /// closed stream is harmless.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => {
                match stream.shutdown(std::net::Shutdown::Both) {
                    Ok(()) => Ok(()),
                    // Peer already gone; nothing left to tear down.
                    Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }
}

impl std::fmt::Debug for PipeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            PipeStreamInner::Unix(_) => f.debug_struct("PipeStream").field("type", &"unix").finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn shutdown_unblocks_clone_read() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = PipeStream::from_unix(left);
        let mut clone = stream.try_clone().unwrap();

        let reader = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            clone.read(&mut buf).unwrap_or(0)
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        stream.shutdown().unwrap();

        let read = reader.join().unwrap();
        assert_eq!(read, 0, "shutdown should surface as EOF to the reader");
        drop(right);
    }

    #[test]
    fn shutdown_twice_is_a_noop() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = PipeStream::from_unix(left);
        stream.shutdown().unwrap();
        stream.shutdown().unwrap();
    }
}
