//! Callbacks the embedding host registers on a session.

use std::sync::Arc;

use crate::error::Error;
use crate::proto::Stream;

/// Worker-side handle for the execution of one request handler.
///
/// Opaque to the session: it is created when a stream's headers complete and
/// polled while the stream lingers as a zombie.
pub trait Task: Send + Sync {
    fn has_finished(&self) -> bool;
}

/// Host hooks around stream lifecycle.
///
/// All hooks run on the connection thread.
pub trait Host {
    /// Build the worker task for a stream whose request is complete. The
    /// stream's input handle may be captured here; returning `None` leaves
    /// the stream without a worker.
    fn create_task(&mut self, stream: &Stream) -> Option<Arc<dyn Task>>;

    /// The stream's request is complete and its task exists; the host
    /// attaches the task to its runtime.
    fn after_stream_open(&mut self, stream: &Stream, task: &Arc<dyn Task>) {
        let _ = (stream, task);
    }

    /// The stream is about to be destroyed. Returning `Error::Again` defers
    /// destruction until the task has finished; with `join == true` the
    /// host must instead wait for the task synchronously.
    fn before_stream_close(
        &mut self,
        stream: &Stream,
        task: &Arc<dyn Task>,
        join: bool,
    ) -> Result<(), Error> {
        let _ = (stream, task, join);
        Ok(())
    }
}
