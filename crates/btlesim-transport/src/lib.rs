//! Named FIFO endpoints for a simulated point-to-point link.
//!
//! A link is two one-directional FIFOs:
//! - MISO, written by the client and read by the server
//! - MOSI, written by the server and read by the client
//!
//! This is the lowest layer of btlesim. The frame layer reads through
//! [`Readiness`] + [`std::io::Read`] and writes through [`std::io::Write`],
//! so any byte stream with a pollable descriptor can stand in for a FIFO.

pub mod error;
pub mod readiness;
pub mod role;

#[cfg(unix)]
pub mod fifo;

pub use error::{Result, TransportError};
pub use readiness::{Readiness, Wait};
pub use role::{Direction, Role};

#[cfg(unix)]
pub use fifo::{
    make_fifo, FifoGuard, FifoLink, FifoPaths, FifoReader, FifoWriter, DEFAULT_FIFO_MODE,
};
