use std::io::{ErrorKind, Write};

use tracing::debug;

use crate::codec::{encode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::frame_type::FrameType;

/// Writes complete frames to the write side of a link.
pub struct Transmitter<W> {
    inner: W,
    config: FrameConfig,
}

impl<W: Write> Transmitter<W> {
    /// Create a new transmitter with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new transmitter with explicit configuration.
    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Send one frame: the header, then the payload (blocking).
    ///
    /// Returns the number of bytes written, header included. If the header
    /// cannot be written the payload is not attempted.
    pub fn send(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<usize> {
        let max = self.config.effective_max_payload();
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        let header = encode_header(frame_type, payload.len())?;
        write_fully(&mut self.inner, &header)?;
        write_fully(&mut self.inner, payload)?;
        self.flush()?;

        debug!(
            frame_type = frame_type.name(),
            size = payload.len(),
            "sent frame"
        );
        Ok(HEADER_SIZE + payload.len())
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send(frame.frame_type, frame.payload.as_ref())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(map_write_error(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the transmitter and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Update maximum payload size for subsequent sends.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current transmitter configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Write all of `buf`, continuing after short writes.
fn write_fully<W: Write>(inner: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match inner.write(&buf[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(map_write_error(err)),
        }
    }
    Ok(())
}

fn map_write_error(err: std::io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::BrokenPipe => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}
