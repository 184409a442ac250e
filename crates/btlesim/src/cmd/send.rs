use std::fs;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use btlesim_frame::{pad_vec, BLOCK_SIZE, MAX_MESSAGE_SIZE};
use btlesim_link::{Channel, LinkConfig};
use btlesim_transport::Role;

use crate::cmd::{next_frame, Next, SendArgs};
use crate::exit::{frame_error, link_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat, config: &LinkConfig) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = resolve_payload(&args)?;

    let mut channel = Channel::open_with_config(Role::Client, config)
        .map_err(|err| link_error("open failed", err))?;

    let sent = channel
        .send(&payload, args.frame_type)
        .map_err(|err| link_error("send failed", err))?;
    tracing::info!(
        frame_type = args.frame_type.name(),
        size = payload.len(),
        wire_bytes = sent,
        "frame sent"
    );

    if args.wait {
        let running = AtomicBool::new(true);
        let deadline = Instant::now() + wait_timeout;
        match next_frame(&mut channel, &running, Some(deadline))? {
            Next::Frame(frame) => print_frame(&frame, Role::Server, format),
            Next::TimedOut => {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no response within {}", args.wait_timeout),
                ))
            }
            Next::Disconnected | Next::Stopped => {
                return Err(CliError::new(FAILURE, "server closed before responding"))
            }
        }
    }

    channel.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    let mut payload = if let Some(data) = &args.data {
        data.as_bytes().to_vec()
    } else if let Some(path) = &args.file {
        fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        })?
    } else {
        Vec::new()
    };

    if args.pad {
        pad_vec(&mut payload, BLOCK_SIZE, MAX_MESSAGE_SIZE)
            .map_err(|err| frame_error("padding failed", err))?;
    }
    Ok(payload)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
