use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, ProtocolError, Result};
use crate::frame_type::FrameType;

/// Frame header: version (1) + type (1) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Protocol version written into every header.
pub const PROTOCOL_VERSION: u8 = 1;

/// Largest payload the 16-bit length field can describe.
pub const MAX_WIRE_PAYLOAD: usize = u16::MAX as usize;

/// Default maximum payload size: the full range of the length field.
pub const DEFAULT_MAX_PAYLOAD: usize = MAX_WIRE_PAYLOAD;

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub frame_type: FrameType,
    pub length: u16,
}

impl FrameHeader {
    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}

/// A complete frame with an owned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(frame_type: FrameType, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame header.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬───────────┬─────────────────┐
/// │ Version   │ Type     │ Length    │ Payload         │
/// │ (1B)      │ (1B)     │ (2B LE)   │ (Length bytes)  │
/// └───────────┴──────────┴───────────┴─────────────────┘
/// ```
///
/// Every field is written explicitly; nothing depends on in-memory layout.
pub fn encode_header(frame_type: FrameType, payload_len: usize) -> Result<[u8; HEADER_SIZE]> {
    let length = u16::try_from(payload_len).map_err(|_| FrameError::PayloadTooLarge {
        size: payload_len,
        max: MAX_WIRE_PAYLOAD,
    })?;

    let mut header = [0u8; HEADER_SIZE];
    let mut dst = &mut header[..];
    dst.put_u8(PROTOCOL_VERSION);
    dst.put_u8(frame_type.as_u8());
    dst.put_u16_le(length);
    Ok(header)
}

/// Decode and validate a frame header.
pub fn decode_header(
    src: &[u8; HEADER_SIZE],
    max_payload: usize,
) -> std::result::Result<FrameHeader, ProtocolError> {
    let mut src = &src[..];
    let version = src.get_u8();
    let type_byte = src.get_u8();
    let length = src.get_u16_le();

    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            found: version,
        });
    }

    let frame_type =
        FrameType::from_u8(type_byte).ok_or(ProtocolError::UnknownFrameType(type_byte))?;

    if length as usize > max_payload {
        return Err(ProtocolError::LengthExceedsMax {
            length: length as usize,
            max: max_payload,
        });
    }

    Ok(FrameHeader {
        version,
        frame_type,
        length,
    })
}

/// Encode a whole frame (header followed by payload) into `dst`.
pub fn encode_frame(frame_type: FrameType, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let header = encode_header(frame_type, payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&header);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for the frame layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 65535 (the wire limit).
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl FrameConfig {
    /// The configured maximum, never above what the length field can carry.
    pub fn effective_max_payload(&self) -> usize {
        self.max_payload_size.min(MAX_WIRE_PAYLOAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_explicit_little_endian() {
        let header = encode_header(FrameType::SecureRecord, 0x1234).unwrap();
        assert_eq!(header, [PROTOCOL_VERSION, 4, 0x34, 0x12]);
    }

    #[test]
    fn decode_header_fields() {
        let header = decode_header(&[1, 3, 5, 0], DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.frame_type, FrameType::Message);
        assert_eq!(header.payload_len(), 5);
    }

    #[test]
    fn decode_rejects_version_mismatch() {
        let err = decode_header(&[2, 3, 5, 0], DEFAULT_MAX_PAYLOAD).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: 2
            }
        );
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let err = decode_header(&[1, 9, 0, 0], DEFAULT_MAX_PAYLOAD).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownFrameType(9));
    }

    #[test]
    fn decode_rejects_length_above_config() {
        let header = encode_header(FrameType::Key, 2048).unwrap();
        let err = decode_header(&header, 1024).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::LengthExceedsMax {
                length: 2048,
                max: 1024
            }
        );
    }

    #[test]
    fn encode_rejects_payload_beyond_length_field() {
        let err = encode_header(FrameType::Message, MAX_WIRE_PAYLOAD + 1).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn encode_frame_appends_payload() {
        let mut buf = BytesMut::new();
        encode_frame(FrameType::Salt, b"pepper", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 6);
        assert_eq!(&buf[..HEADER_SIZE], &[1, 2, 6, 0]);
        assert_eq!(&buf[HEADER_SIZE..], b"pepper");
    }

    #[test]
    fn frame_wire_size() {
        let frame = Frame::new(FrameType::Message, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
    }

    #[test]
    fn effective_max_is_clamped_to_wire_limit() {
        let cfg = FrameConfig {
            max_payload_size: usize::MAX,
        };
        assert_eq!(cfg.effective_max_payload(), MAX_WIRE_PAYLOAD);
        assert_eq!(FrameConfig::default().effective_max_payload(), 65535);
    }
}
