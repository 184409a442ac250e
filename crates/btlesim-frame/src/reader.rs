use std::io::{ErrorKind, Read};

use btlesim_transport::{Readiness, Wait};
use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::codec::{decode_header, Frame, FrameConfig, FrameHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::frame_type::FrameType;

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Where the receiver is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivePhase {
    /// Collecting header bytes; `filled` of [`HEADER_SIZE`] are buffered.
    AwaitingHeader { filled: usize },
    /// Header decoded; `consumed` payload bytes already handed out.
    AwaitingPayload { header: FrameHeader, consumed: usize },
}

impl ReceivePhase {
    const IDLE: ReceivePhase = ReceivePhase::AwaitingHeader { filled: 0 };

    /// True when the next byte on the wire starts a new frame.
    pub fn at_frame_boundary(&self) -> bool {
        *self == Self::IDLE
    }
}

/// Outcome of one [`Receiver::recv`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Payload bytes copied into the caller's buffer by this call.
    pub len: usize,
    /// Type of the frame in progress; `None` until its header is decoded.
    pub frame_type: Option<FrameType>,
    /// True when this call delivered the last payload byte of the frame.
    pub complete: bool,
}

impl Received {
    fn pending(frame_type: Option<FrameType>) -> Self {
        Self {
            len: 0,
            frame_type,
            complete: false,
        }
    }
}

/// Reassembles frames from the read side of a link.
///
/// State survives across calls: a payload larger than the caller's buffer,
/// or split over many reads, is handed out over as many `recv` calls as it
/// takes. Headers split across reads are reassembled the same way.
pub struct Receiver<R> {
    inner: R,
    phase: ReceivePhase,
    header_buf: [u8; HEADER_SIZE],
    config: FrameConfig,
}

impl<R: Read + Readiness> Receiver<R> {
    /// Create a new receiver with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new receiver with explicit configuration.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self {
            inner,
            phase: ReceivePhase::IDLE,
            header_buf: [0u8; HEADER_SIZE],
            config,
        }
    }

    /// Receive payload bytes of the current frame into `out`.
    ///
    /// With `non_block` set, a call that finds no data ready returns a
    /// zero-length [`Received`] at once and keeps all buffered progress.
    /// Otherwise the call waits until at least one step of progress is made.
    ///
    /// Errors:
    /// - [`FrameError::ConnectionClosed`] when the peer closed its end.
    /// - [`FrameError::Protocol`] for a rejected header; the receiver stays
    ///   at a header boundary and does not try to resynchronize.
    /// - [`FrameError::Io`] for other read failures. Mid-payload, the partial
    ///   frame is discarded.
    pub fn recv(&mut self, out: &mut [u8], non_block: bool) -> Result<Received> {
        let wait = Wait::from_non_block(non_block);

        let (header, consumed) = match self.phase {
            ReceivePhase::AwaitingPayload { header, consumed } => (header, consumed),
            ReceivePhase::AwaitingHeader { filled } => match self.read_header(filled, wait)? {
                Some(header) => {
                    trace!(
                        frame_type = header.frame_type.name(),
                        length = header.length,
                        "decoded header"
                    );
                    self.phase = ReceivePhase::AwaitingPayload {
                        header,
                        consumed: 0,
                    };
                    (header, 0)
                }
                None => return Ok(Received::pending(None)),
            },
        };

        self.read_payload(header, consumed, out, wait)
    }

    /// Receive one whole frame, blocking until it is complete.
    ///
    /// If a frame was already partly handed out by [`Receiver::recv`], only
    /// its remaining bytes are returned.
    pub fn recv_frame(&mut self) -> Result<Frame> {
        let mut payload = BytesMut::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let received = self.recv(&mut chunk, false)?;
            if payload.is_empty() {
                if let ReceivePhase::AwaitingPayload { header, consumed } = self.phase {
                    payload.reserve(header.payload_len() - consumed);
                }
            }
            payload.extend_from_slice(&chunk[..received.len]);

            if let (true, Some(frame_type)) = (received.complete, received.frame_type) {
                return Ok(Frame {
                    frame_type,
                    payload: payload.freeze(),
                });
            }
        }
    }

    fn read_header(&mut self, mut filled: usize, wait: Wait) -> Result<Option<FrameHeader>> {
        while filled < HEADER_SIZE {
            if !self.inner.wait_readable(wait)? {
                if wait == Wait::Immediate {
                    return Ok(None);
                }
                continue;
            }

            match self.inner.read(&mut self.header_buf[filled..]) {
                Ok(0) => {
                    self.reset();
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => {
                    filled += n;
                    self.phase = ReceivePhase::AwaitingHeader { filled };
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if wait == Wait::Immediate {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        // Header bytes are consumed whether or not they decode.
        self.phase = ReceivePhase::IDLE;
        match decode_header(&self.header_buf, self.config.effective_max_payload()) {
            Ok(header) => Ok(Some(header)),
            Err(err) => {
                warn!(error = %err, "rejected frame header");
                Err(err.into())
            }
        }
    }

    fn read_payload(
        &mut self,
        header: FrameHeader,
        consumed: usize,
        out: &mut [u8],
        wait: Wait,
    ) -> Result<Received> {
        let frame_type = Some(header.frame_type);
        let remaining = header.payload_len() - consumed;
        if remaining == 0 {
            self.finish(header);
            return Ok(Received {
                len: 0,
                frame_type,
                complete: true,
            });
        }

        let want = out.len().min(remaining);
        if want == 0 {
            return Ok(Received::pending(frame_type));
        }

        loop {
            match self.inner.wait_readable(wait) {
                Ok(true) => {}
                Ok(false) if wait == Wait::Immediate => return Ok(Received::pending(frame_type)),
                Ok(false) => continue,
                Err(err) => return Err(self.abort(FrameError::Io(err))),
            }

            match self.inner.read(&mut out[..want]) {
                Ok(0) => return Err(self.abort(FrameError::ConnectionClosed)),
                Ok(n) => {
                    let consumed = consumed + n;
                    let complete = consumed == header.payload_len();
                    if complete {
                        self.finish(header);
                    } else {
                        trace!(consumed, length = header.length, "partial payload");
                        self.phase = ReceivePhase::AwaitingPayload { header, consumed };
                    }
                    return Ok(Received {
                        len: n,
                        frame_type,
                        complete,
                    });
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if wait == Wait::Immediate {
                        return Ok(Received::pending(frame_type));
                    }
                }
                Err(err) => return Err(self.abort(FrameError::Io(err))),
            }
        }
    }

    fn finish(&mut self, header: FrameHeader) {
        debug!(
            frame_type = header.frame_type.name(),
            size = header.length,
            "received frame"
        );
        self.phase = ReceivePhase::IDLE;
    }

    fn abort(&mut self, err: FrameError) -> FrameError {
        if let ReceivePhase::AwaitingPayload { header, consumed } = self.phase {
            debug!(
                consumed,
                length = header.length,
                error = %err,
                "discarding partial frame"
            );
        }
        self.reset();
        err
    }
}

impl<R> Receiver<R> {
    /// Current position within the frame stream.
    pub fn phase(&self) -> ReceivePhase {
        self.phase
    }

    /// Drop any partial header or payload and expect a header next.
    pub fn reset(&mut self) {
        self.phase = ReceivePhase::IDLE;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the receiver and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Update maximum payload size for subsequent headers.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current receiver configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
