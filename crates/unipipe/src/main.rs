mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "unipipe", version, about = "Named-pipe message bridge CLI")]
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

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "unipipe",
            "send",
            "UnityPipe",
            "--kind",
            "custom",
            "--value",
            "true",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "unipipe",
            "send",
            "--json",
            "{\"kind\":\"custom\",\"value\":\"x\"}",
            "--value",
            "x",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn listen_defaults_to_standard_pipe_name() {
        let cli = Cli::try_parse_from(["unipipe", "listen"]).expect("listen should parse");
        match cli.command {
            Command::Listen(args) => assert_eq!(args.name, "UnityPipe"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn listen_accepts_heartbeat_and_count() {
        let cli = Cli::try_parse_from([
            "unipipe",
            "listen",
            "MyPipe",
            "--heartbeat",
            "500ms",
            "--count",
            "3",
            "--skip-heartbeats",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.name, "MyPipe");
                assert_eq!(args.count, Some(3));
                assert!(args.skip_heartbeats);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
