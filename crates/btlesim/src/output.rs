use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use btlesim_frame::Frame;
use btlesim_transport::Role;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame_type: &'a str,
    frame_type_code: u8,
    payload_size: usize,
    payload: String,
    from: &'a str,
    timestamp: String,
}

impl<'a> FrameOutput<'a> {
    fn new(frame: &'a Frame, from: Role) -> Self {
        Self {
            frame_type: frame.frame_type.name(),
            frame_type_code: frame.frame_type.as_u8(),
            payload_size: frame.payload.len(),
            payload: payload_preview(frame.payload.as_ref()),
            from: from.as_str(),
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print a received frame. `from` is the role that sent it.
pub fn print_frame(frame: &Frame, from: Role, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&FrameOutput::new(frame, from))
                    .unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SIZE", "FROM", "PAYLOAD"])
                .add_row(vec![
                    frame.frame_type.name().to_string(),
                    frame.payload.len().to_string(),
                    from.as_str().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} ({}) size={} from={} payload={}",
                frame.frame_type.name(),
                frame.frame_type.as_u8(),
                frame.payload.len(),
                from,
                payload_preview(frame.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// UTF-8 payloads print as text; trailing zero padding is left off.
fn payload_preview(payload: &[u8]) -> String {
    let end = payload
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |last| last + 1);
    match std::str::from_utf8(&payload[..end]) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
