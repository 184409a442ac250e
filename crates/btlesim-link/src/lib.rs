//! Caller-owned duplex channel over the simulated link.
//!
//! A [`Channel`] bundles the FIFO endpoints for one role with a frame
//! transmitter and a resumable receiver. Open one with [`Channel::open`],
//! exchange frames, and [`Channel::close`] it (or drop it) to tear the link
//! down.

#[cfg(unix)]
pub mod channel;
#[cfg(unix)]
pub mod config;
pub mod error;

#[cfg(unix)]
pub use channel::Channel;
#[cfg(unix)]
pub use config::LinkConfig;
pub use error::{LinkError, Result};

pub use btlesim_frame::{FrameType, ReceivePhase, Received};
pub use btlesim_transport::Role;
