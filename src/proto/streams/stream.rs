use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{uri, HeaderMap, Method, Request, Uri, Version};
use log::trace;
use parking_lot::Mutex;

use crate::error::Error;
use crate::frame::StreamId;
use crate::host::Task;
use crate::mplx::MplxPort;
use crate::response::Response;

/// Stream lifecycle states, in transition order. There are no backward
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Open,
    HalfClosedRemote,
    Closed,
}

/// Request-side input of a stream, shared with its worker task.
///
/// The session appends on the connection thread; the worker drains from its
/// own thread through a `Weak` handle, so a finished stream never stays
/// alive on the worker's account.
#[derive(Debug, Default)]
pub struct StreamInput {
    request: Option<Request<()>>,
    body: VecDeque<Bytes>,
    eos: bool,
}

impl StreamInput {
    /// Take the assembled request. Available once END_HEADERS was seen.
    pub fn take_request(&mut self) -> Option<Request<()>> {
        self.request.take()
    }

    pub fn pop_data(&mut self) -> Option<Bytes> {
        self.body.pop_front()
    }

    pub fn is_eos(&self) -> bool {
        self.eos
    }

    fn set_request(&mut self, request: Request<()>) {
        self.request = Some(request);
    }

    fn push_data(&mut self, data: Bytes) {
        self.body.push_back(data);
    }

    fn close(&mut self) {
        self.eos = true;
    }
}

/// Pseudo headers accumulated before END_HEADERS, broken out as they cannot
/// be stored in the regular field section.
#[derive(Debug, Default)]
struct Pseudo {
    method: Option<Bytes>,
    scheme: Option<Bytes>,
    authority: Option<Bytes>,
    path: Option<Bytes>,
}

/// One request/response exchange multiplexed on the session.
///
/// All methods run on the connection thread; the worker side only ever sees
/// the shared [`StreamInput`].
pub struct Stream {
    id: StreamId,
    state: StreamState,
    mplx: Arc<dyn MplxPort>,

    // header section staging until END_HEADERS
    pseudo: Pseudo,
    fields: HeaderMap,
    eoh: bool,

    /// Request head seeded by `rwrite`, promoted to the input on END_HEADERS.
    seeded: Option<Request<()>>,

    input: Arc<Mutex<StreamInput>>,
    task: Option<Arc<dyn Task>>,
    response: Option<Response>,

    /// True while the codec's body pull is parked waiting for output.
    suspended: bool,
}

impl Stream {
    pub(crate) fn new(id: StreamId, mplx: Arc<dyn MplxPort>) -> Stream {
        Stream {
            id,
            state: StreamState::Idle,
            mplx,
            pseudo: Pseudo::default(),
            fields: HeaderMap::new(),
            eoh: false,
            seeded: None,
            input: Arc::new(Mutex::new(StreamInput::default())),
            task: None,
            response: None,
            suspended: false,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Worker-side handle to the stream's input. The handle is weak; it
    /// never extends the stream's lifetime.
    pub fn input(&self) -> Weak<Mutex<StreamInput>> {
        Arc::downgrade(&self.input)
    }

    pub(crate) fn open(&mut self) -> Result<(), Error> {
        if self.state != StreamState::Idle {
            return Err(Error::Proto);
        }
        self.state = StreamState::Open;
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        self.state = StreamState::Closed;
        self.suspended = false;
    }

    /// Append one header field to the pending section.
    pub(crate) fn write_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), Error> {
        if self.eoh || !self.is_input_open() {
            return Err(Error::Proto);
        }

        if let Some(pseudo) = name.strip_prefix(b":") {
            let slot = match pseudo {
                b"method" => &mut self.pseudo.method,
                b"scheme" => &mut self.pseudo.scheme,
                b"authority" => &mut self.pseudo.authority,
                b"path" => &mut self.pseudo.path,
                _ => return Err(Error::Proto),
            };
            // repeated pseudo headers are malformed
            if slot.is_some() {
                return Err(Error::Proto);
            }
            *slot = Some(Bytes::copy_from_slice(value));
            return Ok(());
        }

        let name = HeaderName::from_bytes(name).map_err(|_| Error::Proto)?;
        let value = HeaderValue::from_bytes(value).map_err(|_| Error::Proto)?;
        self.fields.append(name, value);
        Ok(())
    }

    /// END_HEADERS: freeze the header section into a request and enable
    /// body acceptance.
    pub(crate) fn write_eoh(&mut self) -> Result<(), Error> {
        if self.eoh || !self.is_input_open() {
            return Err(Error::Proto);
        }

        let request = match self.seeded.take() {
            Some(request) => request,
            None => self.assemble_request()?,
        };
        self.input.lock().set_request(request);
        self.eoh = true;
        Ok(())
    }

    /// Append body bytes to the stream's input.
    pub(crate) fn write_data(&mut self, data: &[u8]) -> Result<(), Error> {
        match self.state {
            StreamState::HalfClosedRemote | StreamState::Closed => return Err(Error::Proto),
            _ => {}
        }
        if !self.eoh {
            return Err(Error::Proto);
        }

        self.input.lock().push_data(Bytes::copy_from_slice(data));
        Ok(())
    }

    /// Mark input end-of-stream. Idempotent.
    pub(crate) fn write_eos(&mut self) -> Result<(), Error> {
        self.input.lock().close();
        if self.state == StreamState::Open {
            self.state = StreamState::HalfClosedRemote;
        }
        Ok(())
    }

    /// Seed the stream from a pre-parsed HTTP/1 request; `write_eoh` still
    /// performs the header-section transition. Only used to bootstrap
    /// stream 1 of an h2c upgrade.
    pub(crate) fn rwrite(&mut self, request: Request<Bytes>) -> Result<(), Error> {
        if self.eoh || !self.is_input_open() {
            return Err(Error::Proto);
        }

        let (head, body) = request.into_parts();
        self.seeded = Some(Request::from_parts(head, ()));
        if !body.is_empty() {
            self.input.lock().push_data(body);
        }
        Ok(())
    }

    pub(crate) fn set_task(&mut self, task: Arc<dyn Task>) {
        self.task = Some(task);
    }

    pub(crate) fn task(&self) -> Option<Arc<dyn Task>> {
        self.task.clone()
    }

    pub(crate) fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    pub(crate) fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Fill `buf` from the stream's output source. `Ok((n, eos))` on
    /// progress, `Error::Again` when the worker has not caught up yet and
    /// the caller will suspend, `Error::Eof` once drained.
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<(usize, bool), Error> {
        if self.state == StreamState::Closed {
            return Err(Error::Eof);
        }
        self.mplx.out_read(self.id, buf)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub(crate) fn set_suspended(&mut self, suspended: bool) {
        if self.suspended != suspended {
            trace!(
                "stream({}): {}",
                self.id,
                if suspended { "suspended" } else { "resumed" }
            );
        }
        self.suspended = suspended;
    }

    fn is_input_open(&self) -> bool {
        matches!(self.state, StreamState::Idle | StreamState::Open)
    }

    /// Build the request head from the accumulated pseudo and regular
    /// fields. Requests must carry `:method`, `:scheme` and a non-empty
    /// `:path`; `:authority` is optional.
    fn assemble_request(&mut self) -> Result<Request<()>, Error> {
        let method = match self.pseudo.method.take() {
            Some(raw) => Method::from_bytes(&raw).map_err(|_| Error::Proto)?,
            None => return Err(Error::Proto),
        };

        let mut parts = uri::Parts::default();

        match self.pseudo.scheme.take() {
            Some(raw) => {
                parts.scheme = Some(uri::Scheme::try_from(&raw[..]).map_err(|_| Error::Proto)?);
            }
            None => return Err(Error::Proto),
        }

        if let Some(raw) = self.pseudo.authority.take() {
            parts.authority =
                Some(uri::Authority::try_from(&raw[..]).map_err(|_| Error::Proto)?);
        }

        match self.pseudo.path.take() {
            Some(raw) if !raw.is_empty() => {
                parts.path_and_query =
                    Some(uri::PathAndQuery::try_from(&raw[..]).map_err(|_| Error::Proto)?);
            }
            _ => return Err(Error::Proto),
        }

        let uri = Uri::from_parts(parts).map_err(|_| Error::Proto)?;

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .version(Version::HTTP_2)
            .body(())
            .map_err(|_| Error::Proto)?;
        *request.headers_mut() = std::mem::take(&mut self.fields);

        Ok(request)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Stream")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("suspended", &self.suspended)
            .finish()
    }
}
