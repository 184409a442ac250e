/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error (creating or opening the FIFOs).
    #[error("transport error: {0}")]
    Transport(#[from] btlesim_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] btlesim_frame::FrameError),

    /// The channel was already closed.
    #[error("channel is closed")]
    Closed,
}

impl LinkError {
    /// True when the peer hung up or this side already closed.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            LinkError::Closed | LinkError::Frame(btlesim_frame::FrameError::ConnectionClosed)
        )
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
