mod store;
mod stream;

pub use self::stream::{Stream, StreamInput, StreamState};

pub(crate) use self::store::StreamSet;
