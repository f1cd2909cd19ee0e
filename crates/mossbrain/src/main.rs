mod cmd;
mod exit;
mod logging;
mod output;
mod settings;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, RelayArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "mossbrain",
    version,
    about = "Control a Moss brain block over Bluetooth",
    long_about = "Control a Moss brain block over Bluetooth.\n\n\
                  Without a subcommand, reads `<command> <arg>...` lines from stdin, \
                  sends each to the device and prints the reply values."
)]
struct Cli {
    /// Device Bluetooth address (skips discovery).
    #[arg(short, long, env = "MOSSBRAIN_ADDRESS", global = true)]
    address: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON client configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(exit::USAGE);
        }
        Err(err) => err.exit(),
    };
    init_logging(cli.log_format, cli.log_level.with_debug(cli.debug));

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let settings = Settings {
        config_path: cli.config,
        address: cli.address,
    };
    let command = cli
        .command
        .unwrap_or_else(|| Command::Relay(RelayArgs::default()));

    match cmd::run(command, &settings, format) {
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
    fn no_subcommand_means_relay() {
        let cli = Cli::try_parse_from(["mossbrain", "-a", "00:11:22:33:44:55", "-d"])
            .expect("relay args should parse");

        assert!(cli.command.is_none());
        assert!(cli.debug);
        assert_eq!(cli.address.as_deref(), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn parses_call_with_args() {
        let cli = Cli::try_parse_from(["mossbrain", "call", "setLEDState", "0", "255", "0"])
            .expect("call args should parse");

        match cli.command {
            Some(Command::Call(args)) => {
                assert_eq!(args.command, "setLEDState");
                assert_eq!(args.args, vec![0, 255, 0]);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mossbrain", "scan", "--prefix", "Moss", "--format", "json"])
            .expect("scan args should parse");
        assert!(matches!(cli.command, Some(Command::Scan(_))));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn rejects_non_integer_call_args() {
        let err = Cli::try_parse_from(["mossbrain", "call", "setLEDState", "red"])
            .expect_err("non-integer should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
