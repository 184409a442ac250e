/// A well-formed read produced a header this implementation rejects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The header's version byte differs from [`crate::PROTOCOL_VERSION`].
    #[error("protocol version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: u8, found: u8 },

    /// The header's type byte is not a known [`crate::FrameType`].
    #[error("unknown frame type {0:#04x}")]
    UnknownFrameType(u8),

    /// The header announces a payload above the configured maximum.
    #[error("frame length {length} exceeds maximum {max}")]
    LengthExceedsMax { length: usize, max: usize },
}

/// Errors that can occur while sending, receiving or padding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed its end of the link.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The received header was rejected.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Padding would grow the payload past the available capacity.
    #[error("padded length {required} exceeds capacity {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },

    /// Padding was requested with a block size of zero.
    #[error("block size must be greater than zero")]
    InvalidBlockSize,
}

impl FrameError {
    /// True for errors that leave the link usable for the next frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::Protocol(_)
                | FrameError::PayloadTooLarge { .. }
                | FrameError::CapacityExceeded { .. }
                | FrameError::InvalidBlockSize
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
