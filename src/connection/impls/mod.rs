//! Concrete [`super::IpmiConnection`] implementations.

#[cfg(feature = "unix-file")]
mod file;
#[cfg(feature = "unix-file")]
pub use file::File;

#[cfg(feature = "unix-streams")]
mod streams;
#[cfg(feature = "unix-streams")]
pub use streams::Streams;

#[cfg(feature = "parking_lot")]
mod shared;
#[cfg(feature = "parking_lot")]
pub use shared::SharedConnection;

use std::io;
use std::time::Duration;

use super::{IpmiConnection, Request, Response};

/// A BMC device transport picked at runtime rather than compile time, so a
/// caller can probe `/dev/ipmi0` and fall back to `/dev/bmc` (or vice versa)
/// without two separate code paths.
pub enum Connection {
    /// The Linux ioctl (`/dev/ipmi0`) backend.
    #[cfg(feature = "unix-file")]
    File(File),
    /// The illumos STREAMS (`/dev/bmc`) backend.
    #[cfg(feature = "unix-streams")]
    Streams(Streams),
}

impl core::fmt::Debug for Connection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            #[cfg(feature = "unix-file")]
            Self::File(_) => f.write_str("Connection::File"),
            #[cfg(feature = "unix-streams")]
            Self::Streams(_) => f.write_str("Connection::Streams"),
        }
    }
}

impl Connection {
    /// Open `path` as a Linux ioctl device.
    #[cfg(feature = "unix-file")]
    pub fn file(path: impl AsRef<std::path::Path>, recv_timeout: Duration) -> io::Result<Self> {
        Ok(Self::File(File::new(path, recv_timeout)?))
    }

    /// Open `path` as an illumos STREAMS device.
    #[cfg(feature = "unix-streams")]
    pub fn streams(path: impl AsRef<std::path::Path>, recv_timeout: Duration) -> io::Result<Self> {
        Ok(Self::Streams(Streams::new(path, recv_timeout)?))
    }
}

impl IpmiConnection for Connection {
    type SendError = io::Error;
    type RecvError = io::Error;
    type Error = io::Error;

    fn send(&mut self, request: &mut Request) -> io::Result<()> {
        match self {
            #[cfg(feature = "unix-file")]
            Self::File(inner) => inner.send(request),
            #[cfg(feature = "unix-streams")]
            Self::Streams(inner) => inner.send(request),
        }
    }

    fn recv(&mut self) -> io::Result<Response> {
        match self {
            #[cfg(feature = "unix-file")]
            Self::File(inner) => inner.recv(),
            #[cfg(feature = "unix-streams")]
            Self::Streams(inner) => inner.recv(),
        }
    }

    fn send_recv(&mut self, request: &mut Request) -> io::Result<Response> {
        match self {
            #[cfg(feature = "unix-file")]
            Self::File(inner) => inner.send_recv(request),
            #[cfg(feature = "unix-streams")]
            Self::Streams(inner) => inner.send_recv(request),
        }
    }
}
