use std::fmt;
use std::io;

use thiserror::Error;

/// Session-level status codes.
///
/// The taxonomy mirrors what the pump and the codec callbacks need to
/// distinguish: transient conditions that are retried on the next round
/// (`Again`, `TimedOut`), orderly shutdown (`Eof`), protocol violations
/// surfaced to the codec, and terminal connection failures.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation would block; retry on the next pump round.
    #[error("resource temporarily unavailable")]
    Again,

    /// A bounded wait elapsed without progress.
    #[error("operation timed out")]
    TimedOut,

    /// End of stream; no more bytes will ever be produced.
    #[error("end of stream")]
    Eof,

    /// A peer or state-machine violation.
    #[error("protocol error")]
    Proto,

    /// The session was aborted; only destruction remains.
    #[error("connection aborted")]
    ConnAborted,

    /// An h2c upgrade request arrived without the `HTTP2-Settings` header.
    #[error("HTTP2-Settings header missing in request")]
    MissingUpgradeSettings,

    /// An internal invariant did not hold.
    #[error("internal error")]
    Internal,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if the operation may be retried on a later round.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Again | Error::TimedOut)
    }
}

/// HTTP/2 error codes, as defined in [Section 7] of RFC 7540.
///
/// [Section 7]: https://http2.github.io/http2-spec/#ErrorCodes
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Reason(u32);

impl Reason {
    pub const NO_ERROR: Reason = Reason(0);
    pub const PROTOCOL_ERROR: Reason = Reason(1);
    pub const INTERNAL_ERROR: Reason = Reason(2);
    pub const FLOW_CONTROL_ERROR: Reason = Reason(3);
    pub const SETTINGS_TIMEOUT: Reason = Reason(4);
    pub const STREAM_CLOSED: Reason = Reason(5);
    pub const FRAME_SIZE_ERROR: Reason = Reason(6);
    pub const REFUSED_STREAM: Reason = Reason(7);
    pub const CANCEL: Reason = Reason(8);
    pub const COMPRESSION_ERROR: Reason = Reason(9);
    pub const CONNECT_ERROR: Reason = Reason(10);
    pub const ENHANCE_YOUR_CALM: Reason = Reason(11);
    pub const INADEQUATE_SECURITY: Reason = Reason(12);
    pub const HTTP_1_1_REQUIRED: Reason = Reason(13);

    /// Get a string description of the error code.
    pub fn description(&self) -> &str {
        match self.0 {
            0 => "not a result of an error",
            1 => "unspecific protocol error detected",
            2 => "unexpected internal error encountered",
            3 => "flow-control protocol violated",
            4 => "settings ACK not received in timely manner",
            5 => "received frame when stream half-closed",
            6 => "frame with invalid size",
            7 => "refused stream before processing any application logic",
            8 => "stream no longer needed",
            9 => "unable to maintain the header compression context",
            10 => "connection established in response to a CONNECT request was reset or abnormally closed",
            11 => "detected excessive load generating behavior",
            12 => "security properties do not meet minimum requirements",
            13 => "endpoint requires HTTP/1.1",
            _ => "unknown reason",
        }
    }
}

impl From<u32> for Reason {
    fn from(src: u32) -> Reason {
        Reason(src)
    }
}

impl From<Reason> for u32 {
    fn from(src: Reason) -> u32 {
        src.0
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.0 {
            0 => "NO_ERROR",
            1 => "PROTOCOL_ERROR",
            2 => "INTERNAL_ERROR",
            3 => "FLOW_CONTROL_ERROR",
            4 => "SETTINGS_TIMEOUT",
            5 => "STREAM_CLOSED",
            6 => "FRAME_SIZE_ERROR",
            7 => "REFUSED_STREAM",
            8 => "CANCEL",
            9 => "COMPRESSION_ERROR",
            10 => "CONNECT_ERROR",
            11 => "ENHANCE_YOUR_CALM",
            12 => "INADEQUATE_SECURITY",
            13 => "HTTP_1_1_REQUIRED",
            other => return write!(fmt, "Reason({})", other),
        };
        write!(fmt, "{}", name)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.description())
    }
}
