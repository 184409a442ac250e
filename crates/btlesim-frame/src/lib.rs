//! Versioned message framing for the simulated link.
//!
//! Every message is framed with a 4-byte header:
//! - A 1-byte protocol version
//! - A 1-byte frame type
//! - A 2-byte little-endian payload length
//!
//! The [`Receiver`] reassembles frames across any number of short reads and
//! calls, in blocking or non-blocking mode.

pub mod codec;
pub mod error;
pub mod frame_type;
pub mod padding;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, encode_frame, encode_header, Frame, FrameConfig, FrameHeader,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAX_WIRE_PAYLOAD, PROTOCOL_VERSION,
};
pub use error::{FrameError, ProtocolError, Result};
pub use frame_type::FrameType;
pub use padding::{pad_to_block, pad_vec, padded_len, BLOCK_SIZE, MAX_MESSAGE_SIZE};
pub use reader::{ReceivePhase, Received, Receiver};
pub use writer::Transmitter;
