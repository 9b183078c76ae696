//! The per-connection session: codec callbacks, the read/write pump and the
//! lifecycle protocol around GOAWAY, abort and teardown.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Request, StatusCode};
use log::{debug, info, trace, warn};

use crate::codec::{CallbackError, Codec, CodecError, CodecOptions, DataPull, Events, Setting};
use crate::config::Config;
use crate::conn_io::{BlockMode, ConnIo, IoBuffer};
use crate::error::{Error, Reason};
use crate::frame::{FrameInfo, StreamId};
use crate::host::Host;
use crate::mplx::{IoWait, MplxPort};

use super::streams::{Stream, StreamSet};

/// Stream id synthesized for the request that carried an h2c upgrade.
const UPGRADE_STREAM: StreamId = StreamId::new(1);

/// The per-connection orchestrator owning one codec instance.
///
/// Everything here runs on the connection thread. Worker tasks communicate
/// exclusively through the multiplexer and the [`IoWait`] primitive; they
/// never call into the session.
pub struct Session {
    // Dropped before `inner`, so callbacks can never outlive their context.
    codec: Box<dyn Codec>,
    inner: Inner,
}

/// Callback-facing session state, split from the codec so that driving the
/// codec can hand out `&mut dyn Events` without aliasing it.
struct Inner {
    id: u64,
    config: Config,

    streams: StreamSet,
    zombies: StreamSet,

    mplx: Arc<dyn MplxPort>,
    io: IoBuffer,
    iowait: Arc<IoWait>,
    host: Box<dyn Host>,

    /// The HTTP/1 request that carried an h2c upgrade, consumed by `start`.
    bootstrap: Option<Request<Bytes>>,

    aborted: bool,
    /// Permits the single post-abort send that flushes the final GOAWAY.
    draining: bool,

    frames_received: u64,
}

impl Session {
    /// Create a session for a direct (prior-knowledge or TLS) HTTP/2
    /// connection.
    pub fn new<F>(
        id: u64,
        config: Config,
        io: Box<dyn ConnIo>,
        mplx: Arc<dyn MplxPort>,
        host: Box<dyn Host>,
        build_codec: F,
    ) -> Session
    where
        F: FnOnce(&CodecOptions) -> Box<dyn Codec>,
    {
        Session::new_int(id, config, io, mplx, host, build_codec, None)
    }

    /// Create a session bootstrapped from an HTTP/1 `Upgrade: h2c` request.
    /// `start` will replay the request as stream 1.
    pub fn with_upgrade<F>(
        id: u64,
        config: Config,
        io: Box<dyn ConnIo>,
        mplx: Arc<dyn MplxPort>,
        host: Box<dyn Host>,
        request: Request<Bytes>,
        build_codec: F,
    ) -> Session
    where
        F: FnOnce(&CodecOptions) -> Box<dyn Codec>,
    {
        Session::new_int(id, config, io, mplx, host, build_codec, Some(request))
    }

    fn new_int<F>(
        id: u64,
        config: Config,
        io: Box<dyn ConnIo>,
        mplx: Arc<dyn MplxPort>,
        host: Box<dyn Host>,
        build_codec: F,
        bootstrap: Option<Request<Bytes>>,
    ) -> Session
    where
        F: FnOnce(&CodecOptions) -> Box<dyn Codec>,
    {
        let options = CodecOptions {
            // The connection driver reads the preface; traffic must not
            // confuse the codec state machine before that.
            recv_client_preface: true,
            peer_max_concurrent_streams: config.max_streams,
            // Window credit is managed by the pump.
            no_auto_window_update: true,
        };
        let codec = build_codec(&options);

        Session {
            codec,
            inner: Inner {
                id,
                config,
                streams: StreamSet::new(),
                zombies: StreamSet::new(),
                mplx,
                io: IoBuffer::new(io),
                iowait: Arc::new(IoWait::new()),
                host,
                bootstrap,
                aborted: false,
                draining: false,
                frames_received: 0,
            },
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The wait primitive workers must signal (through the multiplexer)
    /// after enqueuing output.
    pub fn io_wait(&self) -> Arc<IoWait> {
        self.inner.iowait.clone()
    }

    /// Start the conversation by submitting the server SETTINGS frame. In
    /// h2c mode the upgrade request is replayed as stream 1 first.
    pub fn start(&mut self) -> Result<(), Error> {
        if let Some(request) = self.inner.bootstrap.take() {
            let payload = match request.headers().get("http2-settings") {
                Some(value) => URL_SAFE_NO_PAD.decode(value.as_bytes()).map_err(|_| {
                    warn!("session({}): invalid HTTP2-Settings payload", self.inner.id);
                    Error::Proto
                })?,
                None => {
                    warn!(
                        "session({}): HTTP2-Settings header missing in request",
                        self.inner.id
                    );
                    return Err(Error::MissingUpgradeSettings);
                }
            };

            debug!(
                "session({}): upgrading h2c session, {} settings bytes",
                self.inner.id,
                payload.len()
            );
            if let Err(e) = self.codec.upgrade(&payload) {
                warn!("session({}): upgrade: {}", self.inner.id, e);
                return Err(Error::Proto);
            }

            // Auto-open stream 1 for the request we got.
            self.inner
                .stream_open(UPGRADE_STREAM)
                .map_err(|_| Error::Internal)?;
            match self.inner.streams.get_mut(UPGRADE_STREAM) {
                Some(stream) => stream.rwrite(request)?,
                None => return Err(Error::Internal),
            }
            self.inner.stream_end_headers(UPGRADE_STREAM, true)?;
            if let Some(stream) = self.inner.streams.get_mut(UPGRADE_STREAM) {
                stream.write_eos()?;
            }
        }

        let settings = [
            Setting::MaxHeaderListSize(self.inner.config.max_header_list_size),
            Setting::InitialWindowSize(self.inner.config.initial_window_size),
            Setting::MaxConcurrentStreams(self.inner.config.max_streams),
        ];
        self.codec.submit_settings(&settings).map_err(|e| {
            warn!("session({}): submit settings: {}", self.inner.id, e);
            Error::Internal
        })
    }

    /// Pull bytes from the connection and feed them to the codec. Fatal
    /// codec errors abort the session.
    pub fn read(&mut self, block: BlockMode) -> Result<(), Error> {
        let mut block = block;
        let mut total = 0;

        loop {
            let data = match self.inner.io.read(block) {
                Ok(data) => data,
                Err(e) if e.is_transient() && total > 0 => return Ok(()),
                Err(e) => return Err(e),
            };
            if data.is_empty() {
                return Ok(());
            }
            total += data.len();

            let mut rest = &data[..];
            while !rest.is_empty() {
                match self.codec.mem_recv(&mut self.inner, rest) {
                    Ok(0) => break,
                    Ok(n) => rest = &rest[n..],
                    Err(e) => {
                        debug!("session({}): mem_recv: {}", self.inner.id, e);
                        if e.is_fatal() {
                            self.abort_session(Reason::from(e));
                            return Err(Error::ConnAborted);
                        }
                        break;
                    }
                }
            }

            block = BlockMode::NonBlocking;
        }
    }

    /// One cooperative write round: credit windows, drive the codec, submit
    /// ready responses, resume suspended streams, optionally wait on worker
    /// output, flush, reap zombies.
    ///
    /// `Error::Again` means the round found nothing to do; `Error::TimedOut`
    /// that the idle wait elapsed.
    pub fn write(&mut self, timeout: Duration) -> Result<(), Error> {
        let mut have_written = false;
        let mut status: Result<(), Error> = Err(Error::Again);

        // Check that any pending window updates are sent.
        match self.update_windows() {
            Ok(()) => {
                have_written = true;
                status = Ok(());
            }
            Err(Error::Again) => {}
            Err(e) => return Err(e),
        }

        if self.codec.want_write() {
            status = self.drive_send();
            have_written = true;
        }

        // If we have responses ready, submit them now.
        while let Some(response) = self.inner.mplx.pop_response() {
            let id = response.stream_id();
            match self.inner.streams.get_mut(id) {
                Some(stream) => {
                    stream.set_response(response);
                    status = self.handle_response(id);
                    have_written = true;
                }
                None => {
                    debug!(
                        "session({}): response for unknown stream({}), dropped",
                        self.inner.id, id
                    );
                }
            }
        }

        if self.resume_streams_with_data() > 0 {
            have_written = true;
        }

        if !have_written && !timeout.is_zero() && !self.codec.want_write() {
            status = self.inner.mplx.out_trywait(timeout, &self.inner.iowait);
            if self.resume_streams_with_data() > 0 {
                have_written = true;
            }
        }

        if self.codec.want_write() {
            status = self.drive_send();
            have_written = true;
        }

        if have_written {
            if let Err(e) = self.inner.io.flush() {
                debug!("session({}): flush: {}", self.inner.id, e);
            }
        }

        self.reap_zombies();

        status
    }

    /// Flush any pending output.
    pub fn close(&mut self) -> Result<(), Error> {
        self.inner.io.flush()
    }

    /// True once the session has nothing left to do: aborted, or the codec
    /// wants neither read nor write.
    pub fn is_done(&self) -> bool {
        self.inner.aborted || (!self.codec.want_read() && !self.codec.want_write())
    }

    /// Announce shutdown. With no error this is a shutdown notice that lets
    /// in-flight streams complete; with an error it is a terminal GOAWAY
    /// carrying the codec's last processed stream id.
    pub fn goaway(&mut self, error: Option<Reason>) -> Result<(), Error> {
        if self.inner.aborted {
            return Err(Error::ConnAborted);
        }

        let rv = match error {
            None => self.codec.submit_shutdown_notice(),
            Some(reason) => {
                let last = self.codec.last_proc_stream_id();
                self.codec.submit_goaway(last, reason)
            }
        };
        rv.map_err(|e| {
            warn!("session({}): submit goaway: {}", self.inner.id, e);
            Error::Internal
        })
    }

    /// Abort the session. Idempotent; translates the status into a GOAWAY
    /// reason before terminating the codec.
    pub fn abort(&mut self, reason: &Error) {
        let code = match reason {
            Error::Eof => Reason::NO_ERROR,
            Error::ConnAborted => Reason::CANCEL,
            _ => Reason::PROTOCOL_ERROR,
        };
        self.abort_session(code);
    }

    /// Diagnostic counter of frames received over the session's lifetime.
    pub fn frames_received(&self) -> u64 {
        self.inner.frames_received
    }

    pub fn open_streams(&self) -> usize {
        self.inner.streams.len()
    }

    pub fn zombie_streams(&self) -> usize {
        self.inner.zombies.len()
    }

    /// Log the state of every active stream.
    pub fn log_stats(&self) {
        info!(
            "session({}): {} open streams",
            self.inner.id,
            self.inner.streams.len()
        );
        self.inner.streams.for_each(|stream| {
            info!(
                "stream({}-{}): in set, state={:?}, suspended={}, has_data={}",
                self.inner.id,
                stream.id(),
                stream.state(),
                stream.is_suspended(),
                self.inner.mplx.out_has_data_for(stream.id())
            );
            true
        });
    }

    // ===== pump internals =====

    /// Translate the multiplexer's consumed-input accounting into codec
    /// flow-control credit. `Error::Again` when nothing was pending.
    fn update_windows(&mut self) -> Result<(), Error> {
        let id = self.inner.id;
        let codec = &mut self.codec;
        self.inner.mplx.in_update_windows(&mut |stream_id, bytes| {
            trace!("stream({}-{}): crediting {} bytes", id, stream_id, bytes);
            if let Err(e) = codec.consume(stream_id, bytes) {
                debug!("stream({}-{}): consume: {}", id, stream_id, e);
            }
        })
    }

    fn drive_send(&mut self) -> Result<(), Error> {
        match self.codec.send(&mut self.inner) {
            Ok(()) => Ok(()),
            Err(e) => {
                info!("session({}): send: {}", self.inner.id, e);
                if e.is_fatal() {
                    self.abort_session(Reason::from(e));
                    Err(Error::ConnAborted)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Submit the response attached to a stream: a HEADERS block with
    /// `:status` first, or RST_STREAM when the worker produced no status.
    fn handle_response(&mut self, id: StreamId) -> Result<(), Error> {
        let block = match self.inner.streams.get(id).and_then(|s| s.response()) {
            Some(response) => match response.status() {
                Some(status) => {
                    trace!(
                        "stream({}-{}): submitting response {}",
                        self.inner.id,
                        id,
                        status
                    );
                    Some(header_block(status, response.headers()))
                }
                None => None,
            },
            None => return Ok(()),
        };

        let rv = match block {
            Some(headers) => self.codec.submit_response(id, &headers),
            None => self.codec.submit_rst_stream(id, Reason::INTERNAL_ERROR),
        };

        match rv {
            Ok(()) => {
                debug!("stream({}-{}): submitted response", self.inner.id, id);
                Ok(())
            }
            Err(e) => {
                warn!("stream({}-{}): submit response: {}", self.inner.id, id, e);
                if e.is_fatal() {
                    self.abort_session(Reason::from(e));
                    Err(Error::ConnAborted)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Resume all streams which had been suspended and now have data in the
    /// out queue. Returns the number of streams resumed.
    fn resume_streams_with_data(&mut self) -> usize {
        if self.inner.streams.is_empty() || self.inner.aborted {
            return 0;
        }

        let mut resumed = 0;
        for id in self.inner.streams.ids() {
            let ready = self
                .inner
                .streams
                .get(id)
                .map(|s| s.is_suspended())
                .unwrap_or(false)
                && self.inner.mplx.out_has_data_for(id);
            if !ready {
                continue;
            }

            if let Some(stream) = self.inner.streams.get_mut(id) {
                stream.set_suspended(false);
            }
            resumed += 1;

            match self.codec.resume_data(id) {
                Ok(()) => debug!("stream({}-{}): resuming stream", self.inner.id, id),
                Err(e) => {
                    warn!("stream({}-{}): resume: {}", self.inner.id, id, e);
                    if e.is_fatal() {
                        self.abort_session(Reason::from(e));
                        break;
                    }
                }
            }
        }
        resumed
    }

    /// Drop zombie streams whose worker has finished.
    fn reap_zombies(&mut self) {
        self.inner.mplx.cleanup();

        while let Some(id) = self
            .inner
            .zombies
            .find(|s| s.task().map(|t| t.has_finished()).unwrap_or(true))
            .map(|s| s.id())
        {
            trace!(
                "session({}): reaping zombie stream({})",
                self.inner.id,
                id
            );
            self.inner.zombies.remove(id);
        }
    }

    fn abort_session(&mut self, reason: Reason) {
        if self.inner.aborted {
            return;
        }
        self.inner.aborted = true;

        info!(
            "session({}): aborting session, reason={:?}",
            self.inner.id, reason
        );
        self.codec.terminate_session(reason);
        let _ = self.codec.submit_goaway(StreamId::ZERO, reason);

        // One last send so the GOAWAY reaches the wire.
        self.inner.draining = true;
        let _ = self.codec.send(&mut self.inner);
        self.inner.draining = false;
        if let Err(e) = self.inner.io.flush() {
            debug!("session({}): flush on abort: {}", self.inner.id, e);
        }

        self.inner.mplx.abort();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.inner.streams.is_empty() {
            info!(
                "session({}): destroy, {} streams open",
                self.inner.id,
                self.inner.streams.len()
            );
            for id in self.inner.streams.ids() {
                let _ = self.inner.close_active_stream(id, true);
            }
        }
        if !self.inner.zombies.is_empty() {
            info!(
                "session({}): destroy, {} zombie streams",
                self.inner.id,
                self.inner.zombies.len()
            );
            for id in self.inner.zombies.ids() {
                let _ = self.inner.join_zombie_stream(id);
            }
        }
    }
}

fn header_block(status: StatusCode, fields: &[(HeaderName, HeaderValue)]) -> Vec<(Bytes, Bytes)> {
    let mut block = Vec::with_capacity(fields.len() + 1);
    block.push((
        Bytes::from_static(b":status"),
        Bytes::copy_from_slice(status.as_str().as_bytes()),
    ));
    for (name, value) in fields {
        block.push((
            Bytes::copy_from_slice(name.as_str().as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        ));
    }
    block
}

// ===== impl Inner =====

impl Inner {
    /// True once callbacks must short-circuit. The final GOAWAY send after
    /// an abort is exempt.
    fn failing(&self) -> bool {
        self.aborted && !self.draining
    }

    fn stream_open(&mut self, id: StreamId) -> Result<(), CallbackError> {
        let mut stream = Stream::new(id, self.mplx.clone());
        stream
            .open()
            .map_err(|_| CallbackError::InvalidStreamId)?;

        if self.streams.insert(stream).is_err() {
            debug!(
                "session({}): stream({}): unable to add to set",
                self.id, id
            );
            return Err(CallbackError::InvalidStreamId);
        }

        debug!("stream({}-{}): opened", self.id, id);
        self.mplx.open_io(id);
        Ok(())
    }

    /// END_HEADERS: freeze the request, mark input EOS if END_STREAM was
    /// set, then hand the stream to a worker task.
    fn stream_end_headers(&mut self, id: StreamId, eos: bool) -> Result<(), Error> {
        let stream = match self.streams.get_mut(id) {
            Some(stream) => stream,
            None => return Err(Error::Internal),
        };

        stream.write_eoh()?;
        if eos {
            stream.write_eos()?;
        }

        if let Some(task) = self.host.create_task(stream) {
            stream.set_task(task.clone());
            self.host.after_stream_open(stream, &task);
        }
        Ok(())
    }

    /// Remove a stream from the active set and destroy it, unless the host
    /// defers destruction, in which case it becomes a zombie.
    fn close_active_stream(&mut self, id: StreamId, join: bool) -> Result<(), Error> {
        let mut stream = match self.streams.remove(id) {
            Some(stream) => stream,
            None => return Ok(()),
        };
        debug!("stream({}-{}): closing", self.id, id);
        stream.close();

        let status = match stream.task() {
            Some(task) => self.host.before_stream_close(&stream, &task, join),
            None => Ok(()),
        };

        match status {
            Ok(()) => Ok(()),
            Err(Error::Again) => {
                debug!("stream({}-{}): close delayed by callback", self.id, id);
                let _ = self.zombies.insert(stream);
                Err(Error::Again)
            }
            Err(e) => Err(e),
        }
    }

    /// Synchronously finish a zombie: the host waits for the task, then the
    /// stream is destroyed.
    fn join_zombie_stream(&mut self, id: StreamId) -> Result<(), Error> {
        let stream = match self.zombies.remove(id) {
            Some(stream) => stream,
            None => return Ok(()),
        };
        debug!("stream({}-{}): join zombie", self.id, id);

        match stream.task() {
            Some(task) => self.host.before_stream_close(&stream, &task, true),
            None => Ok(()),
        }
    }
}

impl Events for Inner {
    fn send(&mut self, data: &[u8]) -> Result<usize, CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }

        match self.io.write(data) {
            Ok(n) => Ok(n),
            Err(e) if e.is_transient() => Err(CallbackError::WouldBlock),
            Err(e) => {
                debug!("session({}): send error: {}", self.id, e);
                Err(CallbackError::Proto)
            }
        }
    }

    fn on_begin_headers(&mut self, stream_id: StreamId) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }
        self.stream_open(stream_id)
    }

    fn on_header(
        &mut self,
        stream_id: StreamId,
        name: &[u8],
        value: &[u8],
    ) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }

        match self.streams.get_mut(stream_id) {
            Some(stream) => stream
                .write_header(name, value)
                .map_err(|_| CallbackError::Proto),
            None => {
                warn!(
                    "session({}): stream({}): on_header for unknown stream",
                    self.id, stream_id
                );
                Err(CallbackError::InvalidStreamId)
            }
        }
    }

    fn on_data_chunk_recv(
        &mut self,
        stream_id: StreamId,
        data: &[u8],
    ) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }

        match self.streams.get_mut(stream_id) {
            Some(stream) => {
                let status = stream.write_data(data);
                trace!(
                    "stream({}-{}): written DATA, length {}",
                    self.id,
                    stream_id,
                    data.len()
                );
                status.map_err(|_| CallbackError::Proto)
            }
            None => {
                warn!(
                    "session({}): stream({}): on_data_chunk for unknown stream",
                    self.id, stream_id
                );
                Err(CallbackError::InvalidStreamId)
            }
        }
    }

    fn on_frame_recv(&mut self, frame: &FrameInfo) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }

        self.frames_received += 1;
        trace!(
            "session({}): on_frame_recv #{}, {}",
            self.id,
            self.frames_received,
            frame
        );

        let mut status = Ok(());
        match frame {
            FrameInfo::Headers { stream_id, .. } => {
                if !self.streams.contains(*stream_id) {
                    warn!(
                        "session({}): stream({}): HEADERS frame for unknown stream",
                        self.id, stream_id
                    );
                    return Err(CallbackError::InvalidStreamId);
                }
                if frame.is_end_headers() {
                    status = self.stream_end_headers(*stream_id, frame.is_end_stream());
                }
            }
            FrameInfo::Data { stream_id, .. } => {
                if !self.streams.contains(*stream_id) {
                    warn!(
                        "session({}): stream({}): DATA frame for unknown stream",
                        self.id, stream_id
                    );
                    return Err(CallbackError::Proto);
                }
            }
            _ => trace!("session({}): on_frame_recv {}", self.id, frame),
        }

        if frame.is_end_stream() {
            if let Some(stream) = self.streams.get_mut(frame.stream_id()) {
                status = status.and(stream.write_eos());
                debug!("stream({}-{}): input closed", self.id, frame.stream_id());
            }
        }

        status.map_err(|e| {
            warn!(
                "session({}): stream({}): error handling frame: {}",
                self.id,
                frame.stream_id(),
                e
            );
            CallbackError::InvalidStreamState
        })
    }

    fn on_stream_close(
        &mut self,
        stream_id: StreamId,
        error_code: u32,
    ) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }

        if self.streams.contains(stream_id) {
            let _ = self.close_active_stream(stream_id, false);
        }

        if error_code != 0 {
            info!(
                "stream({}-{}): close error {}",
                self.id, stream_id, error_code
            );
        }
        Ok(())
    }

    fn on_invalid_frame_recv(
        &mut self,
        frame: &FrameInfo,
        error_code: u32,
    ) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }
        trace!(
            "session({}): on_invalid_frame_recv error={} {}",
            self.id,
            error_code,
            frame
        );
        Ok(())
    }

    fn before_frame_send(&mut self, frame: &FrameInfo) -> Result<(), CallbackError> {
        if self.failing() {
            return Err(CallbackError::Failure);
        }
        trace!("session({}): before_frame_send {}", self.id, frame);
        Ok(())
    }

    fn on_frame_send(&mut self, frame: &FrameInfo) {
        trace!("session({}): on_frame_send {}", self.id, frame);
    }

    fn on_frame_not_send(&mut self, frame: &FrameInfo, error: CodecError) {
        debug!(
            "session({}): on_frame_not_send error={} {}",
            self.id, error, frame
        );
    }

    fn pull_data(&mut self, stream_id: StreamId, buf: &mut [u8]) -> DataPull {
        let stream = match self.streams.get_mut(stream_id) {
            Some(stream) => stream,
            None => {
                // An in-flight pull may still land after RST; fatal for
                // this callback only.
                warn!(
                    "stream({}-{}): data requested but stream not found",
                    self.id, stream_id
                );
                return DataPull::Failed;
            }
        };

        debug_assert!(!stream.is_suspended());

        match stream.read(buf) {
            Ok((len, eos)) => {
                trace!(
                    "stream({}-{}): requested {}, sending {} data bytes (eos={})",
                    self.id,
                    stream_id,
                    buf.len(),
                    len,
                    eos
                );
                DataPull::Chunk { len, eos }
            }
            Err(Error::Again) => {
                stream.set_suspended(true);
                debug!("stream({}-{}): suspending stream", self.id, stream_id);
                DataPull::Deferred
            }
            Err(Error::Eof) => DataPull::Chunk { len: 0, eos: true },
            Err(e) => {
                warn!("stream({}-{}): reading data: {}", self.id, stream_id, e);
                DataPull::Failed
            }
        }
    }
}
