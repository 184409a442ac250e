use std::path::PathBuf;

/// Errors that can occur while setting up or using link endpoints.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to create the named FIFO backing one direction of the link.
    #[error("failed to create fifo {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open an existing FIFO.
    #[error("failed to open fifo {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path exists but is not a FIFO.
    #[error("existing path is not a fifo: {path}")]
    NotAFifo { path: PathBuf },

    /// The path cannot be passed to the OS (interior NUL byte).
    #[error("invalid fifo path: {path}")]
    InvalidPath { path: PathBuf },

    /// An I/O error occurred on an endpoint.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
