//! Server-side HTTP/2 session core.
//!
//! This crate bridges a one-request-per-connection web server with the
//! multiplexed HTTP/2 wire protocol. A [`Session`] owns one connection:
//! it decodes inbound frames through a pluggable [`Codec`], dispatches each
//! logical request to a worker task, and remultiplexes responses back onto
//! the wire while honoring flow control, concurrency limits and
//! graceful-shutdown semantics.
//!
//! The framing codec, the worker runtime, the multiplexer and the byte
//! transport are external collaborators, reached through the [`Codec`],
//! [`Host`], [`MplxPort`] and [`ConnIo`] contracts. The connection driver
//! runs the pump:
//!
//! ```text
//! while !session.is_done() {
//!     session.read(BlockMode::NonBlocking)?;
//!     session.write(timeout)?;
//! }
//! ```
//!
//! The session and the codec run on the connection thread only. Worker
//! tasks run wherever the host runtime puts them and communicate solely
//! through the multiplexer's thread-safe queues and the [`IoWait`]
//! condition primitive.

mod codec;
mod config;
mod conn_io;
mod error;
mod frame;
mod host;
mod mplx;
mod proto;
mod response;

pub use crate::codec::{
    CallbackError, Codec, CodecError, CodecOptions, DataPull, Events, Setting,
};
pub use crate::config::Config;
pub use crate::conn_io::{BlockMode, ConnIo};
pub use crate::error::{Error, Reason};
pub use crate::frame::{FrameInfo, StreamId};
pub use crate::host::{Host, Task};
pub use crate::mplx::{IoWait, MplxPort};
pub use crate::proto::{
    Session, Stream, StreamInput, StreamState, WindowSize, DEFAULT_INITIAL_WINDOW_SIZE,
    MAX_WINDOW_SIZE,
};
pub use crate::response::Response;
