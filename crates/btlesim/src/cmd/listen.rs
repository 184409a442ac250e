use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use btlesim_link::{Channel, LinkConfig};
use btlesim_transport::Role;

use crate::cmd::{install_ctrlc_handler, next_frame, ListenArgs, Next};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat, config: &LinkConfig) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut channel = Channel::open_with_config(Role::Server, config)
            .map_err(|err| link_error("open failed", err))?;

        loop {
            let frame = match next_frame(&mut channel, &running, None)? {
                Next::Frame(frame) => frame,
                Next::Disconnected => break,
                Next::Stopped | Next::TimedOut => return Ok(SUCCESS),
            };

            print_frame(&frame, Role::Client, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }

        channel.close();
    }

    Ok(SUCCESS)
}
