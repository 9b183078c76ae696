//! Scripted stand-ins for the session's external collaborators: codec,
//! transport, multiplexer and host runtime.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use h2_session::{
    BlockMode, CallbackError, Codec, CodecError, CodecOptions, Config, ConnIo, DataPull, Error,
    Events, FrameInfo, Host, IoWait, MplxPort, Reason, Response, Session, Setting, Stream,
    StreamId, StreamInput, StreamState, Task,
};

/// Frame size the mock codec asks for per body pull.
const PULL_CHUNK: usize = 16_384;

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ===== scripted codec =====

/// One inbound event the codec replays on the next `mem_recv`.
pub enum Ev {
    BeginHeaders(u32),
    Header(u32, &'static str, &'static str),
    DataChunk(u32, &'static [u8]),
    FrameRecv(FrameInfo),
    StreamClose(u32, u32),
    Fatal(CodecError),
}

/// A submit call recorded by the mock codec.
#[derive(Debug, PartialEq, Eq)]
pub enum Submitted {
    Settings(Vec<Setting>),
    Response {
        stream_id: u32,
        headers: Vec<(String, String)>,
    },
    RstStream {
        stream_id: u32,
        reason: Reason,
    },
    GoAway {
        last_stream_id: u32,
        reason: Reason,
    },
    ShutdownNotice,
}

enum Out {
    Frame { info: FrameInfo, len: usize },
    Body(u32),
}

pub struct CodecState {
    script: VecDeque<Ev>,
    queue: VecDeque<Out>,

    pub submitted: Vec<Submitted>,
    pub resumes: Vec<u32>,
    pub consumed: Vec<(u32, usize)>,
    pub cb_errors: Vec<CallbackError>,
    /// Per stream: body bytes emitted and whether EOS was flagged.
    pub data_emitted: HashMap<u32, (usize, bool)>,
    pub deferred: Vec<u32>,
    pub terminated: Option<Reason>,
    pub upgraded: Option<Vec<u8>>,
    pub last_proc_stream_id: u32,
    pub want_read: bool,
    pub options: Option<CodecOptions>,
}

impl Default for CodecState {
    fn default() -> Self {
        CodecState {
            script: VecDeque::new(),
            queue: VecDeque::new(),
            submitted: vec![],
            resumes: vec![],
            consumed: vec![],
            cb_errors: vec![],
            data_emitted: HashMap::new(),
            deferred: vec![],
            terminated: None,
            upgraded: None,
            last_proc_stream_id: 0,
            want_read: true,
            options: None,
        }
    }
}

impl CodecState {
    pub fn goaways(&self) -> Vec<(u32, Reason)> {
        self.submitted
            .iter()
            .filter_map(|s| match s {
                Submitted::GoAway {
                    last_stream_id,
                    reason,
                } => Some((*last_stream_id, *reason)),
                _ => None,
            })
            .collect()
    }

    pub fn responses(&self) -> Vec<u32> {
        self.submitted
            .iter()
            .filter_map(|s| match s {
                Submitted::Response { stream_id, .. } => Some(*stream_id),
                _ => None,
            })
            .collect()
    }
}

pub struct MockCodec {
    pub state: Arc<Mutex<CodecState>>,
}

impl Codec for MockCodec {
    fn mem_recv(&mut self, events: &mut dyn Events, data: &[u8]) -> Result<usize, CodecError> {
        loop {
            let ev = match self.state.lock().script.pop_front() {
                Some(ev) => ev,
                None => return Ok(data.len()),
            };

            let result = match ev {
                Ev::BeginHeaders(id) => events.on_begin_headers(id.into()),
                Ev::Header(id, name, value) => {
                    events.on_header(id.into(), name.as_bytes(), value.as_bytes())
                }
                Ev::DataChunk(id, chunk) => events.on_data_chunk_recv(id.into(), chunk),
                Ev::FrameRecv(frame) => events.on_frame_recv(&frame),
                Ev::StreamClose(id, error_code) => events.on_stream_close(id.into(), error_code),
                Ev::Fatal(e) => return Err(e),
            };

            match result {
                Ok(()) => {}
                Err(CallbackError::Failure) => return Err(CodecError::CallbackFailure),
                Err(e) => self.state.lock().cb_errors.push(e),
            }
        }
    }

    fn send(&mut self, events: &mut dyn Events) -> Result<(), CodecError> {
        loop {
            let out = match self.state.lock().queue.pop_front() {
                Some(out) => out,
                None => return Ok(()),
            };

            match out {
                Out::Frame { info, len } => {
                    match events.before_frame_send(&info) {
                        Ok(()) => {}
                        Err(CallbackError::Failure) => return Err(CodecError::CallbackFailure),
                        Err(_) => return Err(CodecError::Proto),
                    }
                    match events.send(&vec![0u8; len]) {
                        Ok(_) => events.on_frame_send(&info),
                        Err(CallbackError::WouldBlock) => {
                            self.state.lock().queue.push_front(Out::Frame { info, len });
                            return Ok(());
                        }
                        Err(CallbackError::Failure) => return Err(CodecError::CallbackFailure),
                        Err(_) => return Err(CodecError::Proto),
                    }
                }
                Out::Body(id) => loop {
                    let mut buf = [0u8; PULL_CHUNK];
                    match events.pull_data(id.into(), &mut buf) {
                        DataPull::Chunk { len, eos } => {
                            let _ = events.send(&buf[..len]);
                            let mut state = self.state.lock();
                            let entry = state.data_emitted.entry(id).or_insert((0, false));
                            entry.0 += len;
                            if eos {
                                entry.1 = true;
                                break;
                            }
                            if len == 0 {
                                break;
                            }
                        }
                        DataPull::Deferred => {
                            self.state.lock().deferred.push(id);
                            break;
                        }
                        DataPull::Failed => return Err(CodecError::CallbackFailure),
                    }
                },
            }
        }
    }

    fn want_read(&self) -> bool {
        let state = self.state.lock();
        state.want_read && state.terminated.is_none()
    }

    fn want_write(&self) -> bool {
        !self.state.lock().queue.is_empty()
    }

    fn resume_data(&mut self, stream_id: StreamId) -> Result<(), CodecError> {
        let id = u32::from(stream_id);
        let mut state = self.state.lock();
        match state.deferred.iter().position(|&d| d == id) {
            Some(at) => {
                state.deferred.remove(at);
                state.resumes.push(id);
                state.queue.push_back(Out::Body(id));
                Ok(())
            }
            None => Err(CodecError::InvalidArgument),
        }
    }

    fn consume(&mut self, stream_id: StreamId, amount: usize) -> Result<(), CodecError> {
        self.state
            .lock()
            .consumed
            .push((stream_id.into(), amount));
        Ok(())
    }

    fn submit_settings(&mut self, settings: &[Setting]) -> Result<(), CodecError> {
        let mut state = self.state.lock();
        state.submitted.push(Submitted::Settings(settings.to_vec()));
        state.queue.push_back(Out::Frame {
            info: FrameInfo::Settings {
                len: settings.len() * 6,
                ack: false,
            },
            len: 9 + settings.len() * 6,
        });
        Ok(())
    }

    fn submit_response(
        &mut self,
        stream_id: StreamId,
        headers: &[(Bytes, Bytes)],
    ) -> Result<(), CodecError> {
        let id = u32::from(stream_id);
        let rendered = headers
            .iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(name).into_owned(),
                    String::from_utf8_lossy(value).into_owned(),
                )
            })
            .collect();

        let mut state = self.state.lock();
        state.submitted.push(Submitted::Response {
            stream_id: id,
            headers: rendered,
        });
        state.queue.push_back(Out::Frame {
            info: FrameInfo::Headers {
                stream_id,
                len: 32,
                end_headers: true,
                end_stream: false,
            },
            len: 9 + 32,
        });
        state.queue.push_back(Out::Body(id));
        Ok(())
    }

    fn submit_rst_stream(
        &mut self,
        stream_id: StreamId,
        reason: Reason,
    ) -> Result<(), CodecError> {
        let mut state = self.state.lock();
        state.submitted.push(Submitted::RstStream {
            stream_id: stream_id.into(),
            reason,
        });
        state.queue.push_back(Out::Frame {
            info: FrameInfo::RstStream {
                stream_id,
                error_code: reason.into(),
            },
            len: 13,
        });
        Ok(())
    }

    fn submit_goaway(
        &mut self,
        last_stream_id: StreamId,
        reason: Reason,
    ) -> Result<(), CodecError> {
        let mut state = self.state.lock();
        state.submitted.push(Submitted::GoAway {
            last_stream_id: last_stream_id.into(),
            reason,
        });
        state.queue.push_back(Out::Frame {
            info: FrameInfo::GoAway {
                error_code: reason.into(),
                debug_data: Bytes::new(),
            },
            len: 17,
        });
        Ok(())
    }

    fn submit_shutdown_notice(&mut self) -> Result<(), CodecError> {
        let mut state = self.state.lock();
        state.submitted.push(Submitted::ShutdownNotice);
        state.queue.push_back(Out::Frame {
            info: FrameInfo::GoAway {
                error_code: 0,
                debug_data: Bytes::new(),
            },
            len: 17,
        });
        Ok(())
    }

    fn upgrade(&mut self, settings_payload: &[u8]) -> Result<(), CodecError> {
        self.state.lock().upgraded = Some(settings_payload.to_vec());
        Ok(())
    }

    fn last_proc_stream_id(&self) -> StreamId {
        self.state.lock().last_proc_stream_id.into()
    }

    fn terminate_session(&mut self, reason: Reason) {
        let mut state = self.state.lock();
        if state.terminated.is_none() {
            state.terminated = Some(reason);
        }
    }
}

// ===== scripted transport =====

#[derive(Default)]
pub struct IoState {
    pub reads: VecDeque<Bytes>,
    pub written: Vec<u8>,
    pub eof: bool,
}

pub struct MockIo {
    pub state: Arc<Mutex<IoState>>,
}

impl ConnIo for MockIo {
    fn read(&mut self, _block: BlockMode) -> Result<Bytes, Error> {
        let mut state = self.state.lock();
        match state.reads.pop_front() {
            Some(data) => Ok(data),
            None if state.eof => Err(Error::Eof),
            None => Err(Error::Again),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.state.lock().written.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

// ===== scripted multiplexer =====

#[derive(Default)]
struct OutQueue {
    chunks: VecDeque<Bytes>,
    closed: bool,
}

#[derive(Default)]
pub struct MplxState {
    pub opened: Vec<u32>,
    pub responses: VecDeque<Response>,
    out: HashMap<u32, OutQueue>,
    pub credit: VecDeque<(u32, usize)>,
    pub aborted: bool,
    pub cleanups: usize,
    pub wait: Option<Arc<IoWait>>,
}

#[derive(Default)]
pub struct MockMplx {
    pub state: Mutex<MplxState>,
}

impl MockMplx {
    /// Worker side: enqueue response body bytes and wake the pump.
    pub fn push_out(&self, id: u32, data: &[u8]) {
        let mut state = self.state.lock();
        state
            .out
            .entry(id)
            .or_default()
            .chunks
            .push_back(Bytes::copy_from_slice(data));
        if let Some(wait) = &state.wait {
            wait.notify();
        }
    }

    /// Worker side: no more body bytes for this stream.
    pub fn close_out(&self, id: u32) {
        let mut state = self.state.lock();
        state.out.entry(id).or_default().closed = true;
        if let Some(wait) = &state.wait {
            wait.notify();
        }
    }

    /// Worker side: a finished response envelope.
    pub fn push_response(&self, response: Response) {
        let mut state = self.state.lock();
        state.responses.push_back(response);
        if let Some(wait) = &state.wait {
            wait.notify();
        }
    }

    /// Worker side: input bytes consumed, to be credited on the next round.
    pub fn add_credit(&self, id: u32, bytes: usize) {
        self.state.lock().credit.push_back((id, bytes));
    }
}

impl MplxPort for MockMplx {
    fn open_io(&self, stream_id: StreamId) {
        self.state.lock().opened.push(stream_id.into());
    }

    fn pop_response(&self) -> Option<Response> {
        self.state.lock().responses.pop_front()
    }

    fn out_read(&self, stream_id: StreamId, buf: &mut [u8]) -> Result<(usize, bool), Error> {
        let mut state = self.state.lock();
        let queue = match state.out.get_mut(&stream_id.into()) {
            Some(queue) => queue,
            None => return Err(Error::Again),
        };

        let mut filled = 0;
        while filled < buf.len() {
            match queue.chunks.front_mut() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len() - filled);
                    buf[filled..filled + n].copy_from_slice(&chunk[..n]);
                    let _ = chunk.split_to(n);
                    if chunk.is_empty() {
                        queue.chunks.pop_front();
                    }
                    filled += n;
                }
                None => break,
            }
        }

        if filled == 0 {
            if queue.closed {
                return Err(Error::Eof);
            }
            return Err(Error::Again);
        }
        Ok((filled, queue.chunks.is_empty() && queue.closed))
    }

    fn out_has_data_for(&self, stream_id: StreamId) -> bool {
        let state = self.state.lock();
        match state.out.get(&stream_id.into()) {
            Some(queue) => !queue.chunks.is_empty() || queue.closed,
            None => false,
        }
    }

    fn in_update_windows(&self, credit: &mut dyn FnMut(StreamId, usize)) -> Result<(), Error> {
        let pending: Vec<_> = {
            let mut state = self.state.lock();
            state.credit.drain(..).collect()
        };
        if pending.is_empty() {
            return Err(Error::Again);
        }
        for (id, bytes) in pending {
            credit(id.into(), bytes);
        }
        Ok(())
    }

    fn out_trywait(&self, timeout: Duration, wait: &IoWait) -> Result<(), Error> {
        {
            let state = self.state.lock();
            let has_work = !state.responses.is_empty()
                || state
                    .out
                    .values()
                    .any(|queue| !queue.chunks.is_empty() || queue.closed);
            if has_work || state.aborted {
                return Ok(());
            }
        }
        wait.wait(timeout)
    }

    fn cleanup(&self) {
        self.state.lock().cleanups += 1;
    }

    fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        if let Some(wait) = &state.wait {
            wait.notify();
        }
    }
}

// ===== scripted host =====

pub struct TestTask {
    finished: AtomicBool,
}

impl TestTask {
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl Task for TestTask {
    fn has_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct HostState {
    pub created: Vec<(u32, StreamState)>,
    pub requests: Vec<(u32, Option<http::Request<()>>)>,
    pub inputs: HashMap<u32, Weak<Mutex<StreamInput>>>,
    pub tasks: HashMap<u32, Arc<TestTask>>,
    pub closes: Vec<(u32, bool)>,
    pub close_results: VecDeque<Result<(), Error>>,
    pub spawn_tasks: bool,
}

impl HostState {
    fn new() -> Self {
        HostState {
            spawn_tasks: true,
            ..HostState::default()
        }
    }
}

pub struct MockHost {
    pub state: Arc<Mutex<HostState>>,
}

impl Host for MockHost {
    fn create_task(&mut self, stream: &Stream) -> Option<Arc<dyn Task>> {
        let mut state = self.state.lock();
        if !state.spawn_tasks {
            return None;
        }

        let id = u32::from(stream.id());
        let input = stream.input();
        let request = input
            .upgrade()
            .and_then(|input| input.lock().take_request());

        state.created.push((id, stream.state()));
        state.requests.push((id, request));
        state.inputs.insert(id, input);

        let task = Arc::new(TestTask {
            finished: AtomicBool::new(false),
        });
        state.tasks.insert(id, task.clone());
        Some(task)
    }

    fn before_stream_close(
        &mut self,
        stream: &Stream,
        _task: &Arc<dyn Task>,
        join: bool,
    ) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.closes.push((stream.id().into(), join));
        state.close_results.pop_front().unwrap_or(Ok(()))
    }
}

// ===== wiring =====

pub struct TestConn {
    pub session: Session,
    pub codec: Arc<Mutex<CodecState>>,
    pub io: Arc<Mutex<IoState>>,
    pub mplx: Arc<MockMplx>,
    pub host: Arc<Mutex<HostState>>,
}

impl TestConn {
    /// Queue inbound codec events and run one read pass over them.
    pub fn feed(&mut self, events: Vec<Ev>) -> Result<(), Error> {
        self.codec.lock().script.extend(events);
        self.io.lock().reads.push_back(Bytes::from_static(&[0]));
        self.session.read(BlockMode::NonBlocking)
    }

    /// One write round with a short idle timeout.
    pub fn write(&mut self) -> Result<(), Error> {
        self.session.write(Duration::from_millis(50))
    }

    pub fn finish_task(&self, id: u32) {
        if let Some(task) = self.host.lock().tasks.get(&id) {
            task.finish();
        }
    }
}

fn build(config: Config, request: Option<http::Request<Bytes>>) -> TestConn {
    let codec = Arc::new(Mutex::new(CodecState::default()));
    let io = Arc::new(Mutex::new(IoState::default()));
    let mplx = Arc::new(MockMplx::default());
    let host = Arc::new(Mutex::new(HostState::new()));

    let build_codec = {
        let codec = codec.clone();
        move |options: &CodecOptions| {
            codec.lock().options = Some(options.clone());
            Box::new(MockCodec {
                state: codec.clone(),
            }) as Box<dyn Codec>
        }
    };

    let session = match request {
        Some(request) => Session::with_upgrade(
            1,
            config,
            Box::new(MockIo { state: io.clone() }),
            mplx.clone(),
            Box::new(MockHost {
                state: host.clone(),
            }),
            request,
            build_codec,
        ),
        None => Session::new(
            1,
            config,
            Box::new(MockIo { state: io.clone() }),
            mplx.clone(),
            Box::new(MockHost {
                state: host.clone(),
            }),
            build_codec,
        ),
    };

    mplx.state.lock().wait = Some(session.io_wait());

    TestConn {
        session,
        codec,
        io,
        mplx,
        host,
    }
}

pub fn connect(config: Config) -> TestConn {
    build(config, None)
}

pub fn connect_upgrade(config: Config, request: http::Request<Bytes>) -> TestConn {
    build(config, Some(request))
}

/// Codec events of a complete GET request on `id`.
pub fn get_request(id: u32, eos: bool) -> Vec<Ev> {
    vec![
        Ev::BeginHeaders(id),
        Ev::Header(id, ":method", "GET"),
        Ev::Header(id, ":scheme", "https"),
        Ev::Header(id, ":authority", "example.com"),
        Ev::Header(id, ":path", "/"),
        Ev::FrameRecv(FrameInfo::Headers {
            stream_id: id.into(),
            len: 16,
            end_headers: true,
            end_stream: eos,
        }),
    ]
}
