use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;
use crate::settings::Settings;

pub mod call;
pub mod commands;
pub mod doctor;
pub mod relay;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay commands from stdin to the device, one per line (default).
    Relay(RelayArgs),
    /// Send a single command and print the reply.
    Call(CallArgs),
    /// Discover nearby devices.
    Scan(ScanArgs),
    /// List the command table.
    Commands(CommandsArgs),
    /// Run local Bluetooth health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, settings: &Settings, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Relay(args) => relay::run(args, settings),
        Command::Call(args) => call::run(args, settings, format),
        Command::Scan(args) => scan::run(args, settings, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Doctor(args) => doctor::run(args, settings, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct RelayArgs {}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Command name, e.g. getFaceValue.
    pub command: String,
    /// Integer arguments, each 0-255.
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<i64>,
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Name prefix that marks a brain block.
    #[arg(long)]
    pub prefix: Option<String>,
    /// Local adapter index (hciN).
    #[arg(long, value_name = "N")]
    pub hci_dev: Option<u16>,
    /// Inquiry length in units of 1.28s.
    #[arg(long, value_name = "UNITS")]
    pub inquiry_length: Option<u8>,
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
