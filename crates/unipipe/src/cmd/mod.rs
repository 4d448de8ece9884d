use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use unipipe_endpoint::config::DEFAULT_PIPE_NAME;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the server side of the bridge and print received messages.
    Listen(ListenArgs),
    /// Connect as a client and send a single message.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Pipe name to serve.
    #[arg(default_value = DEFAULT_PIPE_NAME)]
    pub name: String,
    /// Bind to an explicit socket path instead of the derived one.
    #[arg(long, value_name = "PATH")]
    pub socket_path: Option<PathBuf>,
    /// Interval between outgoing heartbeats (e.g. 5s, 500ms).
    #[arg(long, default_value = "1s")]
    pub heartbeat: String,
    /// Do not print incoming heartbeat messages.
    #[arg(long)]
    pub skip_heartbeats: bool,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Pipe name to connect to.
    #[arg(default_value = DEFAULT_PIPE_NAME)]
    pub name: String,
    /// Connect to an explicit socket path instead of the derived one.
    #[arg(long, value_name = "PATH")]
    pub socket_path: Option<PathBuf>,
    /// Message kind.
    #[arg(long, short = 'k', default_value = "custom", conflicts_with = "json")]
    pub kind: String,
    /// Message value.
    #[arg(long, short = 'v', conflicts_with = "json")]
    pub value: Option<String>,
    /// Send a raw JSON payload instead of --kind/--value.
    #[arg(long)]
    pub json: Option<String>,
    /// Maximum time to wait for the connection and the flush (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
