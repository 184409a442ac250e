use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use btlesim_frame::{Frame, FrameType};
use btlesim_link::{Channel, LinkConfig, LinkError};
use btlesim_transport::Readiness;
use clap::{Args, Subcommand};

use crate::exit::{link_error, CliError, CliResult, INTERNAL, INTERRUPTED};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod serve;
pub mod version;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(20);
const RECV_CHUNK_SIZE: usize = 4 * 1024;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the server side and echo every frame back.
    Serve(ServeArgs),
    /// Open the client side and send a single frame.
    Send(SendArgs),
    /// Open the server side and print received frames.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: &LinkConfig) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, config),
        Command::Send(args) => send::run(args, format, config),
        Command::Listen(args) => listen::run(args, format, config),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Exit after echoing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Frame type (none, key, salt, message, secure-record).
    #[arg(
        long = "type",
        value_name = "TYPE",
        default_value = "message",
        value_parser = parse_frame_type
    )]
    pub frame_type: FrameType,
    /// Zero-pad the payload to a whole number of cipher blocks.
    #[arg(long)]
    pub pad: bool,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_frame_type(input: &str) -> Result<FrameType, String> {
    FrameType::from_name(input).ok_or_else(|| {
        let known: Vec<_> = FrameType::ALL
            .iter()
            .map(|t| t.name().to_ascii_lowercase().replace('_', "-"))
            .collect();
        format!("unknown frame type '{input}' (expected one of {})", known.join(", "))
    })
}

/// Result of waiting for the next frame on a channel.
#[derive(Debug)]
pub(crate) enum Next {
    Frame(Frame),
    Disconnected,
    Stopped,
    TimedOut,
}

/// Poll `channel` without blocking until a whole frame arrives.
///
/// Returns [`Next::Stopped`] once `running` is cleared and [`Next::TimedOut`]
/// once `deadline` passes with nothing in flight. Rejected headers are logged
/// and skipped; the receiver is already back at a header boundary.
pub(crate) fn next_frame<R, W>(
    channel: &mut Channel<R, W>,
    running: &AtomicBool,
    deadline: Option<Instant>,
) -> CliResult<Next>
where
    R: Read + Readiness,
    W: Write,
{
    let mut chunk = [0u8; RECV_CHUNK_SIZE];
    let mut payload = Vec::new();

    while running.load(Ordering::SeqCst) {
        let received = match channel.recv(&mut chunk, true) {
            Ok(received) => received,
            Err(err) if err.is_disconnect() => return Ok(Next::Disconnected),
            Err(LinkError::Frame(err)) if err.is_recoverable() => {
                tracing::debug!(error = %err, "skipping rejected frame");
                payload.clear();
                continue;
            }
            Err(err) => return Err(link_error("receive failed", err)),
        };

        payload.extend_from_slice(&chunk[..received.len]);
        if let (true, Some(frame_type)) = (received.complete, received.frame_type) {
            return Ok(Next::Frame(Frame::new(frame_type, payload)));
        }

        if received.len == 0 {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(Next::TimedOut);
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    Ok(Next::Stopped)
}

/// First interrupt asks the loop to stop at its next poll; a second one exits
/// at once (needed while blocked opening the link).
pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if running.swap(false, Ordering::SeqCst) {
            tracing::info!("interrupted; stopping (interrupt again to exit now)");
        } else {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;

    use btlesim_frame::FrameConfig;
    use btlesim_transport::Role;

    use super::*;

    type TestChannel = Channel<UnixStream, UnixStream>;

    fn pair() -> (TestChannel, TestChannel) {
        let (miso_w, miso_r) = UnixStream::pair().unwrap();
        let (mosi_w, mosi_r) = UnixStream::pair().unwrap();
        let cfg = FrameConfig::default();
        (
            Channel::from_endpoints(Role::Client, mosi_r, miso_w, &cfg),
            Channel::from_endpoints(Role::Server, miso_r, mosi_w, &cfg),
        )
    }

    #[test]
    fn frame_type_names_parse() {
        assert_eq!(parse_frame_type("key").unwrap(), FrameType::Key);
        assert_eq!(
            parse_frame_type("secure-record").unwrap(),
            FrameType::SecureRecord
        );
        let err = parse_frame_type("bogus").unwrap_err();
        assert!(err.contains("secure-record"));
    }

    #[test]
    fn next_frame_assembles_payload_larger_than_chunk() {
        let (mut client, mut server) = pair();
        let payload = vec![0x5Au8; RECV_CHUNK_SIZE + 100];
        client.send(&payload, FrameType::SecureRecord).unwrap();

        let running = AtomicBool::new(true);
        match next_frame(&mut server, &running, None).unwrap() {
            Next::Frame(frame) => {
                assert_eq!(frame.frame_type, FrameType::SecureRecord);
                assert_eq!(frame.payload.as_ref(), payload.as_slice());
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn next_frame_times_out_when_idle() {
        let (_client, mut server) = pair();
        let running = AtomicBool::new(true);
        let deadline = Instant::now() + Duration::from_millis(50);

        let next = next_frame(&mut server, &running, Some(deadline)).unwrap();
        assert!(matches!(next, Next::TimedOut));
    }

    #[test]
    fn next_frame_reports_disconnect() {
        let (client, mut server) = pair();
        drop(client);
        let running = AtomicBool::new(true);

        let next = next_frame(&mut server, &running, None).unwrap();
        assert!(matches!(next, Next::Disconnected));
    }

    #[test]
    fn next_frame_stops_when_flag_cleared() {
        let (_client, mut server) = pair();
        let running = AtomicBool::new(false);

        let next = next_frame(&mut server, &running, None).unwrap();
        assert!(matches!(next, Next::Stopped));
    }

    #[test]
    fn next_frame_skips_rejected_header() {
        let (mut raw, miso_r) = UnixStream::pair().unwrap();
        let (mosi_w, _mosi_r) = UnixStream::pair().unwrap();
        let mut server =
            Channel::from_endpoints(Role::Server, miso_r, mosi_w, &FrameConfig::default());
        raw.write_all(&[9, 3, 0, 0]).unwrap();
        raw.write_all(&[1, 2, 4, 0, b's', b'a', b'l', b't']).unwrap();

        let running = AtomicBool::new(true);
        match next_frame(&mut server, &running, None).unwrap() {
            Next::Frame(frame) => {
                assert_eq!(frame.frame_type, FrameType::Salt);
                assert_eq!(frame.payload.as_ref(), b"salt");
            }
            other => panic!("expected frame after rejected header, got {other:?}"),
        }
    }
}
