use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use serde::Serialize;
use unipipe_endpoint::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'a str,
    value: &'a str,
    payload_size: usize,
    timestamp: String,
}

/// Print one received payload to stdout.
///
/// `Raw` echoes the wire text untouched. `Json` and `Pretty` parse the
/// payload as a [`Message`] and fall back to raw echo when it is not one.
pub fn print_payload(payload: &str, format: OutputFormat) {
    match format {
        OutputFormat::Raw => println!("{payload}"),
        OutputFormat::Json | OutputFormat::Pretty => match Message::from_json(payload) {
            Ok(msg) => print_message(&msg, payload.len(), format),
            Err(_) => println!("{payload}"),
        },
    }
}

fn print_message(msg: &Message, payload_size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: &msg.kind,
                value: &msg.value,
                payload_size,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} size={} value={}",
                msg.kind, payload_size, msg.value
            );
        }
        OutputFormat::Raw => println!("{}", msg.value),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
