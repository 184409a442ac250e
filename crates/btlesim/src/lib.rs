//! Simulated point-to-point link between two processes on one host.
//!
//! btlesim carries opaque payloads between a CLIENT and a SERVER over a pair
//! of named FIFOs, framed with a small versioned header so a reader can
//! reassemble messages across short reads.
//!
//! # Crate Structure
//!
//! - [`transport`]: FIFO creation, endpoints, roles, and readiness polling
//! - [`frame`]: header codec, frame types, transmitter/receiver, and padding
//! - [`link`]: the duplex [`link::Channel`] (behind the `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use btlesim_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use btlesim_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use btlesim_link::*;
}
