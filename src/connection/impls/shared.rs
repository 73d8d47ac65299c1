//! Serializes concurrent access to a single transport.
//!
//! The BMC firmware and the in-kernel driver both serialize requests: only
//! one request may be outstanding on a given device node at a time, and the
//! response buffer a transport hands back is only valid until the next call
//! into it. [`Ipmi::send_recv`](crate::Ipmi::send_recv) already enforces
//! this for a single thread through `&mut self`; a multi-threaded caller
//! (an HTTP server handling several scrape requests concurrently, say) needs
//! the same exclusion across threads, which is what this wrapper provides.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::{IpmiConnection, Request, Response};

/// A transport shared between threads behind a single lock.
///
/// Cloning a `SharedConnection` clones the `Arc`, not the underlying
/// transport; all clones serialize through the same mutex.
pub struct SharedConnection<CON> {
    inner: Arc<Mutex<CON>>,
}

impl<CON> SharedConnection<CON> {
    /// Wrap `connection` for sharing across threads.
    pub fn new(connection: CON) -> Self {
        Self {
            inner: Arc::new(Mutex::new(connection)),
        }
    }
}

impl<CON> Clone for SharedConnection<CON> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<CON> core::fmt::Debug for SharedConnection<CON> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedConnection").finish_non_exhaustive()
    }
}

impl<CON> IpmiConnection for SharedConnection<CON>
where
    CON: IpmiConnection,
{
    type SendError = CON::SendError;
    type RecvError = CON::RecvError;
    type Error = CON::Error;

    fn send(&mut self, request: &mut Request) -> Result<(), Self::SendError> {
        self.inner.lock().send(request)
    }

    fn recv(&mut self) -> Result<Response, Self::RecvError> {
        self.inner.lock().recv()
    }

    fn send_recv(&mut self, request: &mut Request) -> Result<Response, Self::Error> {
        // Holds the lock for the full round trip rather than per-call, so a
        // second thread's request can't interleave between this send and
        // its matching recv.
        self.inner.lock().send_recv(request)
    }
}
