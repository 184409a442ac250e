use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use btlesim_link::{Channel, LinkConfig};
use btlesim_transport::{Readiness, Role};

use crate::cmd::{install_ctrlc_handler, next_frame, Next, ServeArgs};
use crate::exit::{link_error, CliResult, SUCCESS};

/// Why an echo session on one open link ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Client went away; the link can be reopened.
    Disconnected,
    /// Interrupted.
    Stopped,
    /// The `--count` limit was reached.
    Done,
}

pub fn run(args: ServeArgs, config: &LinkConfig) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut echoed = 0usize;

    while running.load(Ordering::SeqCst) {
        tracing::info!(miso = ?config.paths.miso, mosi = ?config.paths.mosi, "waiting for client");
        let mut channel = Channel::open_with_config(Role::Server, config)
            .map_err(|err| link_error("open failed", err))?;

        match echo_session(&mut channel, &running, args.count, &mut echoed)? {
            SessionEnd::Disconnected => {
                tracing::info!(echoed, "client disconnected");
                channel.close();
            }
            SessionEnd::Stopped | SessionEnd::Done => return Ok(SUCCESS),
        }
    }

    Ok(SUCCESS)
}

/// Echo frames back with their own type until the client leaves, `running`
/// clears, or `echoed` reaches `limit`.
fn echo_session<R, W>(
    channel: &mut Channel<R, W>,
    running: &AtomicBool,
    limit: Option<usize>,
    echoed: &mut usize,
) -> CliResult<SessionEnd>
where
    R: Read + Readiness,
    W: Write,
{
    loop {
        let frame = match next_frame(channel, running, None)? {
            Next::Frame(frame) => frame,
            Next::Disconnected => return Ok(SessionEnd::Disconnected),
            Next::Stopped | Next::TimedOut => return Ok(SessionEnd::Stopped),
        };

        tracing::info!(
            frame_type = frame.frame_type.name(),
            size = frame.payload.len(),
            "echoing frame"
        );
        match channel.send(frame.payload.as_ref(), frame.frame_type) {
            Ok(_) => {}
            Err(err) if err.is_disconnect() => {
                tracing::debug!(error = %err, "client left before the echo");
                return Ok(SessionEnd::Disconnected);
            }
            Err(err) => return Err(link_error("echo send failed", err)),
        }

        *echoed = echoed.saturating_add(1);
        if limit.is_some_and(|count| *echoed >= count) {
            return Ok(SessionEnd::Done);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;

    use btlesim_frame::{FrameConfig, FrameType};

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
    fn echoes_with_same_type_until_limit() {
        let (mut client, mut server) = pair();
        client.send(b"one", FrameType::Key).unwrap();
        client.send(b"two", FrameType::Salt).unwrap();

        let running = AtomicBool::new(true);
        let mut echoed = 0;
        let end = echo_session(&mut server, &running, Some(2), &mut echoed).unwrap();

        assert_eq!(end, SessionEnd::Done);
        assert_eq!(echoed, 2);
        let first = client.recv_frame().unwrap();
        assert_eq!(first.frame_type, FrameType::Key);
        assert_eq!(first.payload.as_ref(), b"one");
        assert_eq!(client.recv_frame().unwrap().frame_type, FrameType::Salt);
    }

    #[test]
    fn client_gone_before_echo_ends_session_cleanly() {
        let (mut client, mut server) = pair();
        client.send(b"fire-and-forget", FrameType::Message).unwrap();
        drop(client);

        let running = AtomicBool::new(true);
        let mut echoed = 0;
        let end = echo_session(&mut server, &running, None, &mut echoed).unwrap();

        assert_eq!(end, SessionEnd::Disconnected);
        assert_eq!(echoed, 0);
    }

    #[test]
    fn count_spans_sessions() {
        let running = AtomicBool::new(true);
        let mut echoed = 0;

        let (mut client, mut server) = pair();
        client.send(b"a", FrameType::Message).unwrap();
        let reader = std::thread::spawn(move || {
            let reply = client.recv_frame().unwrap();
            assert_eq!(reply.payload.as_ref(), b"a");
        });
        let end = echo_session(&mut server, &running, Some(2), &mut echoed).unwrap();
        reader.join().unwrap();
        assert_eq!(end, SessionEnd::Disconnected);
        assert_eq!(echoed, 1);

        let (mut client, mut server) = pair();
        client.send(b"b", FrameType::Message).unwrap();
        let end = echo_session(&mut server, &running, Some(2), &mut echoed).unwrap();
        assert_eq!(end, SessionEnd::Done);
        assert_eq!(echoed, 2);
    }

    #[test]
    fn stops_when_flag_cleared() {
        let (_client, mut server) = pair();
        let running = AtomicBool::new(false);
        let mut echoed = 0;

        let end = echo_session(&mut server, &running, None, &mut echoed).unwrap();
        assert_eq!(end, SessionEnd::Stopped);
    }
}
