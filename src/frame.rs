use std::fmt;

use bytes::Bytes;

/// A stream identifier, as described in [Section 5.1.1] of RFC 7540.
///
/// Client-initiated streams carry odd identifiers; `1` is reserved for the
/// h2c bootstrap request.
///
/// [Section 5.1.1]: https://http2.github.io/http2-spec/#StreamIdentifiers
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct StreamId(u32);

impl StreamId {
    /// Stream ID 0, used for connection-level frames.
    pub const ZERO: StreamId = StreamId(0);

    pub const fn new(id: u32) -> StreamId {
        StreamId(id)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_client_initiated(&self) -> bool {
        self.0 % 2 == 1
    }
}

impl From<u32> for StreamId {
    fn from(src: u32) -> StreamId {
        StreamId(src)
    }
}

impl From<StreamId> for u32 {
    fn from(src: StreamId) -> u32 {
        src.0
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}

/// Summary of a decoded frame, delivered by the codec for dispatch and
/// diagnostics.
///
/// Only the fields the session acts on are carried; payloads stay inside the
/// codec. The `Display` impl renders the compact form used by the trace log.
#[derive(Debug, Clone)]
pub enum FrameInfo {
    Data {
        stream_id: StreamId,
        len: usize,
        end_stream: bool,
        padlen: usize,
    },
    Headers {
        stream_id: StreamId,
        len: usize,
        end_headers: bool,
        end_stream: bool,
    },
    Priority {
        stream_id: StreamId,
        len: usize,
    },
    RstStream {
        stream_id: StreamId,
        error_code: u32,
    },
    Settings {
        len: usize,
        ack: bool,
    },
    PushPromise {
        stream_id: StreamId,
        len: usize,
        end_headers: bool,
    },
    Ping {
        ack: bool,
    },
    GoAway {
        error_code: u32,
        debug_data: Bytes,
    },
    WindowUpdate {
        stream_id: StreamId,
        increment: u32,
    },
    Unknown {
        kind: u8,
        stream_id: StreamId,
        len: usize,
        flags: u8,
    },
}

impl FrameInfo {
    /// The stream the frame belongs to; `StreamId::ZERO` for
    /// connection-level frames.
    pub fn stream_id(&self) -> StreamId {
        use self::FrameInfo::*;

        match *self {
            Data { stream_id, .. }
            | Headers { stream_id, .. }
            | Priority { stream_id, .. }
            | RstStream { stream_id, .. }
            | PushPromise { stream_id, .. }
            | WindowUpdate { stream_id, .. }
            | Unknown { stream_id, .. } => stream_id,
            Settings { .. } | Ping { .. } | GoAway { .. } => StreamId::ZERO,
        }
    }

    pub fn is_headers(&self) -> bool {
        matches!(self, FrameInfo::Headers { .. })
    }

    pub fn is_data(&self) -> bool {
        matches!(self, FrameInfo::Data { .. })
    }

    /// True if the END_STREAM flag is set. Only HEADERS and DATA frames can
    /// carry it.
    pub fn is_end_stream(&self) -> bool {
        match *self {
            FrameInfo::Data { end_stream, .. } => end_stream,
            FrameInfo::Headers { end_stream, .. } => end_stream,
            _ => false,
        }
    }

    /// True if the END_HEADERS flag is set.
    pub fn is_end_headers(&self) -> bool {
        match *self {
            FrameInfo::Headers { end_headers, .. } => end_headers,
            FrameInfo::PushPromise { end_headers, .. } => end_headers,
            _ => false,
        }
    }
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::FrameInfo::*;

        match *self {
            Data {
                stream_id,
                len,
                end_stream,
                padlen,
            } => write!(
                fmt,
                "DATA[length={}, eos={}, stream={}, padlen={}]",
                len, end_stream as u8, stream_id, padlen
            ),
            Headers {
                stream_id,
                len,
                end_headers,
                end_stream,
            } => write!(
                fmt,
                "HEADERS[length={}, hend={}, stream={}, eos={}]",
                len, end_headers as u8, stream_id, end_stream as u8
            ),
            Priority { stream_id, len } => {
                write!(fmt, "PRIORITY[length={}, stream={}]", len, stream_id)
            }
            RstStream {
                stream_id,
                error_code,
            } => write!(fmt, "RST_STREAM[error={}, stream={}]", error_code, stream_id),
            Settings { len, ack } => {
                if ack {
                    write!(fmt, "SETTINGS[ack=1]")
                } else {
                    write!(fmt, "SETTINGS[length={}]", len)
                }
            }
            PushPromise {
                stream_id,
                len,
                end_headers,
            } => write!(
                fmt,
                "PUSH_PROMISE[length={}, hend={}, stream={}]",
                len, end_headers as u8, stream_id
            ),
            Ping { ack } => write!(fmt, "PING[ack={}]", ack as u8),
            GoAway {
                error_code,
                ref debug_data,
            } => write!(
                fmt,
                "GOAWAY[error={}, reason='{}']",
                error_code,
                String::from_utf8_lossy(debug_data)
            ),
            WindowUpdate {
                stream_id,
                increment,
            } => write!(
                fmt,
                "WINDOW_UPDATE[increment={}, stream={}]",
                increment, stream_id
            ),
            Unknown {
                kind,
                stream_id,
                len,
                flags,
            } => write!(
                fmt,
                "FRAME[type={}, length={}, flags={}, stream={}]",
                kind, len, flags, stream_id
            ),
        }
    }
}
