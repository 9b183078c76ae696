//! Contract to the multiplexer, the queueing layer between the connection
//! thread and the worker runtime.

use std::time::Duration;

use crate::error::Error;
use crate::frame::StreamId;
use crate::response::Response;

use parking_lot::{Condvar, Mutex};

/// Handshake surface between the session and the worker side.
///
/// Implementations own their locking; every method may be called from the
/// connection thread while workers are mutating the other side.
pub trait MplxPort: Send + Sync {
    /// A new stream exists; the worker side may allocate its queues.
    fn open_io(&self, stream_id: StreamId);

    /// Non-blocking pop of the next ready response from any stream on this
    /// connection.
    fn pop_response(&self) -> Option<Response>;

    /// Fill `buf` from the output queue of `stream_id`. `Ok((n, eos))` on
    /// progress, `Error::Again` when the worker has not produced bytes yet,
    /// `Error::Eof` once the body is fully drained.
    fn out_read(&self, stream_id: StreamId, buf: &mut [u8]) -> Result<(usize, bool), Error>;

    /// True if the output queue of `stream_id` holds bytes or a final EOS
    /// marker.
    fn out_has_data_for(&self, stream_id: StreamId) -> bool;

    /// Report input bytes consumed by workers since the last call, once per
    /// stream. `Error::Again` when no stream has uncredited bytes.
    fn in_update_windows(&self, credit: &mut dyn FnMut(StreamId, usize)) -> Result<(), Error>;

    /// Block on `wait` until any stream on this connection has new output
    /// or a state change, up to `timeout`. Workers signal `wait` after every
    /// enqueue.
    fn out_trywait(&self, timeout: Duration, wait: &IoWait) -> Result<(), Error>;

    /// Garbage-collect state of fully finished streams.
    fn cleanup(&self);

    /// Mark the multiplexer aborted so blocked workers unwind with an
    /// error.
    fn abort(&self);
}

/// The wait primitive the pump blocks on when there is nothing to write but
/// workers are still running.
///
/// Edge-trigger safe: a notification before the wait is recorded and
/// consumed by the next `wait` call, so a worker signaling between the
/// pump's last check and its sleep cannot be lost.
pub struct IoWait {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl IoWait {
    pub fn new() -> IoWait {
        IoWait {
            signaled: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Wake the pump. Called by workers, through the multiplexer.
    pub fn notify(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cond.notify_one();
    }

    /// Wait for a notification, up to `timeout`. `Error::TimedOut` if none
    /// arrived.
    pub fn wait(&self, timeout: Duration) -> Result<(), Error> {
        let mut signaled = self.signaled.lock();
        if !*signaled {
            let result = self.cond.wait_for(&mut signaled, timeout);
            if result.timed_out() && !*signaled {
                return Err(Error::TimedOut);
            }
        }
        *signaled = false;
        Ok(())
    }
}

impl Default for IoWait {
    fn default() -> Self {
        IoWait::new()
    }
}
