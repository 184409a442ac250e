mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use btlesim_link::LinkConfig;
use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "btlesim", version, about = "Simulated FIFO link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Directory holding the link FIFOs.
    #[arg(
        long,
        value_name = "DIR",
        env = "BTLESIM_LINK_DIR",
        default_value = "/tmp",
        global = true
    )]
    link_dir: PathBuf,

    /// Largest payload accepted in either direction.
    #[arg(long, value_name = "BYTES", global = true)]
    max_payload: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn link_config(&self) -> LinkConfig {
        let config = LinkConfig::default().with_link_dir(&self.link_dir);
        match self.max_payload {
            Some(max) => config.with_max_payload_size(max),
            None => config,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = cli.link_config();
    let result = cmd::run(cli.command, format, &config);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
