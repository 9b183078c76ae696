//! Contract between the session and the HTTP/2 framing codec.
//!
//! The codec is an external library: it parses and serializes frames, runs
//! HPACK and enforces wire-level rules. The session drives it through
//! [`Codec`] and receives events through [`Events`], which every drive call
//! takes as a typed context in place of the usual opaque user pointer.

use std::fmt;

use crate::error::Reason;
use crate::frame::{FrameInfo, StreamId};

use bytes::Bytes;

/// Library-level codec errors.
///
/// Fatal errors poison the codec session; everything else is a condition the
/// caller is expected to translate or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    WouldBlock,
    Eof,
    Proto,
    InvalidArgument,
    InvalidStreamId,
    InvalidStreamState,
    InvalidState,
    FlowControl,
    SessionClosing,
    NoMem,
    CallbackFailure,
    BadClientMagic,
    Flooded,
}

impl CodecError {
    /// True for errors the codec cannot recover from. A fatal error aborts
    /// the session.
    pub fn is_fatal(&self) -> bool {
        use self::CodecError::*;

        matches!(self, NoMem | CallbackFailure | BadClientMagic | Flooded)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::CodecError::*;

        let msg = match *self {
            WouldBlock => "operation would block",
            Eof => "end of input",
            Proto => "protocol error",
            InvalidArgument => "invalid argument",
            InvalidStreamId => "invalid stream id",
            InvalidStreamState => "invalid stream state",
            InvalidState => "invalid state",
            FlowControl => "flow control violated",
            SessionClosing => "session is closing",
            NoMem => "out of memory",
            CallbackFailure => "callback failure",
            BadClientMagic => "bad client connection preface",
            Flooded => "flooding detected",
        };
        fmt.write_str(msg)
    }
}

impl From<CodecError> for Reason {
    fn from(src: CodecError) -> Reason {
        use self::CodecError::*;

        match src {
            Eof => Reason::NO_ERROR,
            FlowControl => Reason::FLOW_CONTROL_ERROR,
            Flooded => Reason::ENHANCE_YOUR_CALM,
            NoMem | CallbackFailure => Reason::INTERNAL_ERROR,
            _ => Reason::PROTOCOL_ERROR,
        }
    }
}

/// Status a callback hands back to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    /// Unrecoverable; the codec turns this into a fatal
    /// [`CodecError::CallbackFailure`].
    Failure,
    /// The referenced stream does not exist.
    InvalidStreamId,
    /// The stream exists but cannot accept the event.
    InvalidStreamState,
    /// Generic protocol violation; the codec decides between RST_STREAM and
    /// connection teardown.
    Proto,
    /// Output cannot be accepted right now; the codec retries later.
    WouldBlock,
}

/// Result of one body pull for an outbound DATA frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPull {
    /// `len` bytes were copied into the destination. `eos` marks the final
    /// chunk.
    Chunk { len: usize, eos: bool },
    /// No bytes available yet. The codec must not ask again for this stream
    /// until `resume_data` is called.
    Deferred,
    /// The pull failed; fatal for this callback.
    Failed,
}

/// One entry of a SETTINGS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    MaxHeaderListSize(u32),
    InitialWindowSize(u32),
    MaxConcurrentStreams(u32),
}

/// Options applied when the codec instance is created.
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// The host reads the client preface itself before handing bytes over.
    pub recv_client_preface: bool,

    /// Assumed peer concurrency cap until the client's SETTINGS arrive.
    pub peer_max_concurrent_streams: u32,

    /// The session manages flow-control credit itself; the codec must not
    /// emit automatic WINDOW_UPDATE frames.
    pub no_auto_window_update: bool,
}

/// Callbacks the codec raises while it is being driven.
///
/// All methods run on the connection thread, inside `mem_recv` or `send`,
/// and must not block.
pub trait Events {
    /// The codec produced serialized bytes for the peer. Returns the number
    /// of bytes accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize, CallbackError>;

    /// A HEADERS frame opened a new stream.
    fn on_begin_headers(&mut self, stream_id: StreamId) -> Result<(), CallbackError>;

    /// One decoded header field for `stream_id`.
    fn on_header(&mut self, stream_id: StreamId, name: &[u8], value: &[u8])
        -> Result<(), CallbackError>;

    /// A chunk of DATA payload for `stream_id`.
    fn on_data_chunk_recv(&mut self, stream_id: StreamId, data: &[u8])
        -> Result<(), CallbackError>;

    /// A complete frame was received.
    fn on_frame_recv(&mut self, frame: &FrameInfo) -> Result<(), CallbackError>;

    /// The codec closed a stream; `error_code` is zero for orderly closes.
    fn on_stream_close(&mut self, stream_id: StreamId, error_code: u32)
        -> Result<(), CallbackError>;

    /// Diagnostic: a frame failed wire-level validation.
    fn on_invalid_frame_recv(&mut self, frame: &FrameInfo, error_code: u32)
        -> Result<(), CallbackError>;

    /// Diagnostic: a frame is about to be serialized.
    fn before_frame_send(&mut self, frame: &FrameInfo) -> Result<(), CallbackError>;

    /// Diagnostic: a frame was serialized.
    fn on_frame_send(&mut self, frame: &FrameInfo);

    /// Diagnostic: a queued frame was dropped.
    fn on_frame_not_send(&mut self, frame: &FrameInfo, error: CodecError);

    /// Pull body bytes for an outbound DATA frame of `stream_id`, filling
    /// `buf`. Registered by `submit_response`.
    fn pull_data(&mut self, stream_id: StreamId, buf: &mut [u8]) -> DataPull;
}

/// Drive and submit surface of the codec.
pub trait Codec {
    /// Feed received bytes. Returns the number of bytes consumed; callbacks
    /// fire synchronously while parsing.
    fn mem_recv(&mut self, events: &mut dyn Events, data: &[u8]) -> Result<usize, CodecError>;

    /// Serialize pending frames, delivering bytes through `Events::send` and
    /// pulling response bodies through `Events::pull_data`. A `WouldBlock`
    /// from the send callback stops the round without error.
    fn send(&mut self, events: &mut dyn Events) -> Result<(), CodecError>;

    fn want_read(&self) -> bool;

    fn want_write(&self) -> bool;

    /// Re-arm the body pull for a stream that previously deferred.
    fn resume_data(&mut self, stream_id: StreamId) -> Result<(), CodecError>;

    /// Credit `amount` consumed bytes back to the peer's flow-control
    /// window for `stream_id`.
    fn consume(&mut self, stream_id: StreamId, amount: usize) -> Result<(), CodecError>;

    fn submit_settings(&mut self, settings: &[Setting]) -> Result<(), CodecError>;

    /// Queue a response HEADERS block. The first entry must be `:status`;
    /// the codec registers a body pull for `stream_id`.
    fn submit_response(
        &mut self,
        stream_id: StreamId,
        headers: &[(Bytes, Bytes)],
    ) -> Result<(), CodecError>;

    fn submit_rst_stream(&mut self, stream_id: StreamId, reason: Reason)
        -> Result<(), CodecError>;

    fn submit_goaway(&mut self, last_stream_id: StreamId, reason: Reason)
        -> Result<(), CodecError>;

    /// Queue a GOAWAY carrying the maximum stream id, announcing shutdown
    /// without closing in-flight streams.
    fn submit_shutdown_notice(&mut self) -> Result<(), CodecError>;

    /// Apply a client SETTINGS payload received out-of-band during an h2c
    /// upgrade.
    fn upgrade(&mut self, settings_payload: &[u8]) -> Result<(), CodecError>;

    fn last_proc_stream_id(&self) -> StreamId;

    /// Poison the codec session; only a final GOAWAY may still be sent.
    fn terminate_session(&mut self, reason: Reason);
}
