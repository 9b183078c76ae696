use http::header::{HeaderName, HeaderValue};
use http::StatusCode;

use crate::frame::StreamId;

/// Response envelope produced by a worker and popped from the multiplexer.
///
/// Carries the status line and header fields in their original order; the
/// body stays on the worker side and is pulled lazily through the
/// multiplexer once the envelope has been submitted to the codec.
#[derive(Debug)]
pub struct Response {
    stream_id: StreamId,
    status: Option<StatusCode>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Response {
    pub fn new(stream_id: StreamId, status: StatusCode) -> Response {
        Response {
            stream_id,
            status: Some(status),
            headers: vec![],
        }
    }

    /// An envelope without a status line. The worker could not produce a
    /// response; the session answers with RST_STREAM.
    pub fn failed(stream_id: StreamId) -> Response {
        Response {
            stream_id,
            status: None,
            headers: vec![],
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Response {
        self.headers.push((name, value));
        self
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}
