//! Zero padding to a block boundary.
//!
//! Block ciphers in the layer above want payloads that are a whole number of
//! blocks. Padding only appends zero bytes; it never touches existing data.

use crate::error::{FrameError, Result};

/// Cipher block size used by the link's security layer.
pub const BLOCK_SIZE: usize = 16;

/// Largest message the security layer exchanges over the link.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Zero-fill `buf[len..]` up to the next multiple of `block_size`.
///
/// Returns the padded length. Fails without writing if the padded length
/// would exceed `max_capacity` or the buffer itself.
pub fn pad_to_block(
    buf: &mut [u8],
    len: usize,
    block_size: usize,
    max_capacity: usize,
) -> Result<usize> {
    let padded = padded_len(len, block_size)?;
    let capacity = max_capacity.min(buf.len());
    if padded > capacity {
        return Err(FrameError::CapacityExceeded {
            required: padded,
            capacity,
        });
    }

    buf[len..padded].fill(0);
    Ok(padded)
}

/// Grow `buf` with zeros to the next multiple of `block_size`.
pub fn pad_vec(buf: &mut Vec<u8>, block_size: usize, max_capacity: usize) -> Result<usize> {
    let padded = padded_len(buf.len(), block_size)?;
    if padded > max_capacity {
        return Err(FrameError::CapacityExceeded {
            required: padded,
            capacity: max_capacity,
        });
    }

    buf.resize(padded, 0);
    Ok(padded)
}

/// Length of `len` rounded up to a multiple of `block_size`.
pub fn padded_len(len: usize, block_size: usize) -> Result<usize> {
    if block_size == 0 {
        return Err(FrameError::InvalidBlockSize);
    }
    match len % block_size {
        0 => Ok(len),
        odd => len
            .checked_add(block_size - odd)
            .ok_or(FrameError::CapacityExceeded {
                required: usize::MAX,
                capacity: usize::MAX,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_next_block() {
        let mut buf = [0xAAu8; 16];
        let new_len = pad_to_block(&mut buf, 10, 16, 16).unwrap();

        assert_eq!(new_len, 16);
        assert_eq!(&buf[..10], &[0xAA; 10]);
        assert_eq!(&buf[10..16], &[0u8; 6]);
    }

    #[test]
    fn capacity_error_leaves_buffer_untouched() {
        let mut buf = [0xAAu8; 16];
        let err = pad_to_block(&mut buf, 10, 16, 12).unwrap_err();

        assert!(matches!(
            err,
            FrameError::CapacityExceeded {
                required: 16,
                capacity: 12
            }
        ));
        assert_eq!(buf, [0xAA; 16]);
    }

    #[test]
    fn buffer_length_bounds_capacity() {
        let mut buf = [1u8; 20];
        let err = pad_to_block(&mut buf, 20, 16, 1024).unwrap_err();
        assert!(matches!(
            err,
            FrameError::CapacityExceeded {
                required: 32,
                capacity: 20
            }
        ));
    }

    #[test]
    fn aligned_length_is_noop_and_padding_is_idempotent() {
        let mut buf = [7u8; 32];
        assert_eq!(pad_to_block(&mut buf, 32, 16, 32).unwrap(), 32);
        assert_eq!(buf, [7u8; 32]);

        let once = pad_to_block(&mut buf, 5, 16, 32).unwrap();
        let snapshot = buf;
        let twice = pad_to_block(&mut buf, once, 16, 32).unwrap();
        assert_eq!(once, twice);
        assert_eq!(buf, snapshot);
    }

    #[test]
    fn zero_length_stays_zero() {
        let mut buf = [0u8; 0];
        assert_eq!(pad_to_block(&mut buf, 0, BLOCK_SIZE, MAX_MESSAGE_SIZE).unwrap(), 0);
    }

    #[test]
    fn zero_block_size_rejected() {
        let mut buf = [0u8; 8];
        assert!(matches!(
            pad_to_block(&mut buf, 3, 0, 8),
            Err(FrameError::InvalidBlockSize)
        ));
    }

    #[test]
    fn pad_vec_grows_in_place() {
        let mut payload = b"hello".to_vec();
        let len = pad_vec(&mut payload, BLOCK_SIZE, MAX_MESSAGE_SIZE).unwrap();

        assert_eq!(len, 16);
        assert_eq!(payload.len(), 16);
        assert_eq!(&payload[..5], b"hello");
        assert!(payload[5..].iter().all(|b| *b == 0));

        assert_eq!(pad_vec(&mut payload, BLOCK_SIZE, MAX_MESSAGE_SIZE).unwrap(), 16);
    }

    #[test]
    fn pad_vec_respects_max_message_size() {
        let mut payload = vec![1u8; MAX_MESSAGE_SIZE - 1];
        assert!(pad_vec(&mut payload, BLOCK_SIZE, MAX_MESSAGE_SIZE).is_ok());

        let mut payload = vec![1u8; MAX_MESSAGE_SIZE + 1];
        let err = pad_vec(&mut payload, BLOCK_SIZE, MAX_MESSAGE_SIZE).unwrap_err();
        assert!(matches!(err, FrameError::CapacityExceeded { .. }));
        assert_eq!(payload.len(), MAX_MESSAGE_SIZE + 1);
    }
}
