use std::io::{Read, Write};

use btlesim_frame::{Frame, FrameConfig, FrameType, ReceivePhase, Received, Receiver, Transmitter};
use btlesim_transport::{FifoGuard, FifoLink, FifoReader, FifoWriter, Readiness, Role};
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};

struct Endpoints<R, W> {
    transmitter: Transmitter<W>,
    receiver: Receiver<R>,
}

/// One end of a duplex link.
///
/// Owns both endpoints and the receive state. Every operation takes
/// `&mut self`, so a channel is driven by one caller at a time.
pub struct Channel<R = FifoReader, W = FifoWriter> {
    role: Role,
    endpoints: Option<Endpoints<R, W>>,
    guard: Option<FifoGuard>,
}

impl Channel {
    /// Open the default link (`/tmp/btleMiso`, `/tmp/btleMosi`) as `role`.
    pub fn open(role: Role) -> Result<Self> {
        Self::open_with_config(role, &LinkConfig::default())
    }

    /// Open a link with explicit configuration.
    ///
    /// Creates the FIFOs if needed. Blocks until the peer has opened its read
    /// side of the FIFO this role writes.
    pub fn open_with_config(role: Role, config: &LinkConfig) -> Result<Self> {
        let link = FifoLink::open(&config.paths, role, config.fifo_mode)?;
        let (role, reader, writer, guard) = link.into_parts();

        Ok(Self {
            role,
            endpoints: Some(Endpoints {
                transmitter: Transmitter::with_config(writer, config.frame.clone()),
                receiver: Receiver::with_config(reader, config.frame.clone()),
            }),
            guard: Some(guard),
        })
    }
}

impl<R: Read + Readiness, W: Write> Channel<R, W> {
    /// Build a channel over an existing endpoint pair.
    ///
    /// No named resources are involved; closing just drops the endpoints.
    pub fn from_endpoints(role: Role, reader: R, writer: W, config: &FrameConfig) -> Self {
        Self {
            role,
            endpoints: Some(Endpoints {
                transmitter: Transmitter::with_config(writer, config.clone()),
                receiver: Receiver::with_config(reader, config.clone()),
            }),
            guard: None,
        }
    }

    /// Send one frame. Returns bytes written, header included.
    pub fn send(&mut self, payload: &[u8], frame_type: FrameType) -> Result<usize> {
        let endpoints = self.endpoints.as_mut().ok_or(LinkError::Closed)?;
        Ok(endpoints.transmitter.send(frame_type, payload)?)
    }

    /// Receive the next piece of the current frame into `buf`.
    ///
    /// See [`Receiver::recv`] for the blocking and resumption rules.
    pub fn recv(&mut self, buf: &mut [u8], non_block: bool) -> Result<Received> {
        let endpoints = self.endpoints.as_mut().ok_or(LinkError::Closed)?;
        Ok(endpoints.receiver.recv(buf, non_block)?)
    }

    /// Receive one whole frame (blocking).
    pub fn recv_frame(&mut self) -> Result<Frame> {
        let endpoints = self.endpoints.as_mut().ok_or(LinkError::Closed)?;
        Ok(endpoints.receiver.recv_frame()?)
    }
}

impl<R, W> Channel<R, W> {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_open(&self) -> bool {
        self.endpoints.is_some()
    }

    /// Receive state, or `None` once closed.
    pub fn receive_phase(&self) -> Option<ReceivePhase> {
        self.endpoints.as_ref().map(|e| e.receiver.phase())
    }

    /// Close both endpoints and remove the backing FIFOs.
    ///
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        let was_open = self.endpoints.take().is_some();
        if let Some(mut guard) = self.guard.take() {
            guard.remove();
        }
        if was_open {
            info!(role = %self.role, "link closed");
        } else {
            debug!(role = %self.role, "close on closed link");
        }
    }
}

impl<R, W> Drop for Channel<R, W> {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}
