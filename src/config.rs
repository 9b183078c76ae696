use crate::proto::{WindowSize, DEFAULT_INITIAL_WINDOW_SIZE};

/// Per-connection configuration snapshot.
///
/// The values are captured when the session is created and advertised to the
/// peer in the initial SETTINGS frame.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of concurrent streams, both the self-advertised cap
    /// and the assumed peer cap until its SETTINGS arrive.
    pub max_streams: u32,

    /// Advertised SETTINGS_MAX_HEADER_LIST_SIZE.
    pub max_header_list_size: u32,

    /// Advertised SETTINGS_INITIAL_WINDOW_SIZE.
    pub initial_window_size: WindowSize,
}

impl Config {
    pub fn max_streams(mut self, max: u32) -> Self {
        self.max_streams = max;
        self
    }

    pub fn max_header_list_size(mut self, size: u32) -> Self {
        self.max_header_list_size = size;
        self
    }

    pub fn initial_window_size(mut self, size: WindowSize) -> Self {
        self.initial_window_size = size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_streams: 100,
            max_header_list_size: 16_384,
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
        }
    }
}
