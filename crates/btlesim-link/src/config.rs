use std::path::Path;

use btlesim_frame::FrameConfig;
use btlesim_transport::{FifoPaths, DEFAULT_FIFO_MODE};

/// Settings for opening a [`crate::Channel`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Where the two FIFOs live.
    pub paths: FifoPaths,
    /// Permission mode for FIFOs this side creates.
    pub fifo_mode: u32,
    /// Frame limits applied in both directions.
    pub frame: FrameConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            paths: FifoPaths::default(),
            fifo_mode: DEFAULT_FIFO_MODE,
            frame: FrameConfig::default(),
        }
    }
}

impl LinkConfig {
    pub fn with_paths(mut self, paths: FifoPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Put both FIFOs under `dir` with their standard names.
    pub fn with_link_dir(self, dir: impl AsRef<Path>) -> Self {
        self.with_paths(FifoPaths::in_dir(dir))
    }

    pub fn with_fifo_mode(mut self, mode: u32) -> Self {
        self.fifo_mode = mode;
        self
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.frame.max_payload_size = max_payload_size;
        self
    }
}
