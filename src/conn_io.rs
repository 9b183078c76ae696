//! Connection I/O contract and the session's buffered write side.

use crate::error::Error;

use bytes::{Bytes, BytesMut};
use log::trace;

/// Initial capacity of the pending-output buffer. `write` reports
/// `Error::Again` once this much is queued, so the codec backs off until the
/// buffer is flushed.
const WRITE_BUFFER_CAPACITY: usize = 64 * 1_024;

/// Read behavior requested by the connection driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Blocking,
    NonBlocking,
}

/// Byte-level transport under the session.
///
/// Implemented by the connection driver; the session never touches a socket
/// directly.
pub trait ConnIo {
    /// Pull the next chunk of received bytes. `Error::Again` when
    /// non-blocking and nothing is available, `Error::Eof` once the peer
    /// closed.
    fn read(&mut self, block: BlockMode) -> Result<Bytes, Error>;

    /// Push serialized bytes toward the socket. Returns the number of bytes
    /// accepted; `Error::Again` when the transport cannot take more.
    fn write(&mut self, data: &[u8]) -> Result<usize, Error>;

    fn flush(&mut self) -> Result<(), Error>;
}

/// The session's I/O buffer pair: reads pass through, writes are staged
/// until the pump flushes.
pub(crate) struct IoBuffer {
    sink: Box<dyn ConnIo>,
    wbuf: BytesMut,
}

impl IoBuffer {
    pub fn new(sink: Box<dyn ConnIo>) -> IoBuffer {
        IoBuffer {
            sink,
            wbuf: BytesMut::with_capacity(WRITE_BUFFER_CAPACITY),
        }
    }

    pub fn read(&mut self, block: BlockMode) -> Result<Bytes, Error> {
        self.sink.read(block)
    }

    /// Stage bytes for the next flush. `Error::Again` once the buffer is at
    /// capacity.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let room = WRITE_BUFFER_CAPACITY.saturating_sub(self.wbuf.len());
        if room == 0 {
            return Err(Error::Again);
        }

        let n = data.len().min(room);
        self.wbuf.extend_from_slice(&data[..n]);
        Ok(n)
    }

    /// Drain staged bytes to the transport. Bytes the transport does not
    /// accept stay queued for the next flush.
    pub fn flush(&mut self) -> Result<(), Error> {
        while !self.wbuf.is_empty() {
            match self.sink.write(&self.wbuf) {
                Ok(0) => return Err(Error::Eof),
                Ok(n) => {
                    let _ = self.wbuf.split_to(n);
                    trace!("conn_io: flushed {} bytes, {} pending", n, self.wbuf.len());
                }
                Err(e) if e.is_transient() => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        self.sink.flush()
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.wbuf.len()
    }
}
