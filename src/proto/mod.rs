mod session;
mod streams;

pub use self::session::Session;
pub use self::streams::{Stream, StreamInput, StreamState};

pub(crate) use self::streams::StreamSet;

pub type WindowSize = u32;

pub const DEFAULT_INITIAL_WINDOW_SIZE: WindowSize = 65_535;
pub const MAX_WINDOW_SIZE: WindowSize = (1 << 31) - 1;
