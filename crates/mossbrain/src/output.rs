use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mossbrain_frame::Command;
use mossbrain_transport::DiscoveredDevice;
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

/// Reply values as the relay writes them: decimal, space separated.
pub fn format_values(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    command: &'a str,
    args: &'a [i64],
    expects_response: bool,
    reply: &'a [u8],
}

pub fn print_reply(command: Command, args: &[i64], reply: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                command: command.name(),
                args,
                expects_response: command.expects_response(),
                reply,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let args: Vec<String> = args.iter().map(i64::to_string).collect();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "ARGS", "REPLY"])
                .add_row(vec![
                    command.name().to_string(),
                    args.join(" "),
                    format_values(reply),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if command.expects_response() {
                println!("{} -> [{}]", command.name(), format_values(reply));
            } else {
                println!("{} (no reply)", command.name());
            }
        }
        OutputFormat::Raw => {
            println!("{}", format_values(reply));
        }
    }
}

#[derive(Serialize)]
struct DeviceOutput<'a> {
    address: &'a str,
    name: &'a str,
    matches: bool,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    prefix: &'a str,
    devices: Vec<DeviceOutput<'a>>,
}

pub fn print_devices(
    devices: &[DiscoveredDevice],
    prefix: &str,
    is_match: impl Fn(&str) -> bool,
    format: OutputFormat,
) {
    let rows: Vec<DeviceOutput<'_>> = devices
        .iter()
        .map(|device| DeviceOutput {
            address: &device.address,
            name: &device.name,
            matches: is_match(&device.name),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = ScanOutput {
                prefix,
                devices: rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "NAME", "MATCH"]);
            for row in &rows {
                table.add_row(vec![
                    row.address.to_string(),
                    row.name.to_string(),
                    if row.matches { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if rows.is_empty() {
                println!("no devices found");
            }
            for row in &rows {
                let marker = if row.matches { '*' } else { ' ' };
                println!("{marker} {} {}", row.address, row.name);
            }
        }
        OutputFormat::Raw => {
            for row in rows.iter().filter(|row| row.matches) {
                println!("{}", row.address);
            }
        }
    }
}

#[derive(Serialize)]
struct CommandOutput {
    name: &'static str,
    opcode: u8,
    expects_response: bool,
}

pub fn print_commands(format: OutputFormat) {
    let rows: Vec<CommandOutput> = Command::ALL
        .iter()
        .map(|command| CommandOutput {
            name: command.name(),
            opcode: command.opcode(),
            expects_response: command.expects_response(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "COMMAND", "REPLY"]);
            for row in &rows {
                table.add_row(vec![
                    format!("0x{:02X}", row.opcode),
                    row.name.to_string(),
                    if row.expects_response { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("0x{:02X} {}", row.opcode, row.name);
            }
        }
    }
}
