use std::path::Path;

use mossbrain_client::ClientConfig;
use mossbrain_transport::{rfcomm, TransportError};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;
use crate::settings::Settings;

const SYSFS_BLUETOOTH: &str = "/sys/class/bluetooth";

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, settings: &Settings, format: OutputFormat) -> CliResult<i32> {
    let mut checks = vec![platform_check()];

    let config = match settings.client_config() {
        Ok(config) => {
            checks.push(config_check(settings, &config));
            config
        }
        Err(err) => {
            checks.push(CheckResult::new("config", CheckStatus::Fail, err.message));
            ClientConfig::default()
        }
    };

    checks.push(adapters_check(Path::new(SYSFS_BLUETOOTH)));
    checks.push(hci_device_check(&config));
    checks.push(rfcomm_socket_check());

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("mossbrain doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<16} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn platform_check() -> CheckResult {
    if cfg!(target_os = "linux") {
        CheckResult::new(
            "platform",
            CheckStatus::Pass,
            "Linux kernel Bluetooth backend",
        )
    } else {
        CheckResult::new(
            "platform",
            CheckStatus::Fail,
            format!("no Bluetooth backend for {}", std::env::consts::OS),
        )
    }
}

fn config_check(settings: &Settings, config: &ClientConfig) -> CheckResult {
    let source = match &settings.config_path {
        Some(path) => path.display().to_string(),
        None => "defaults".to_string(),
    };
    let target = match config.explicit_address() {
        Some(address) => format!("address {address}"),
        None => format!("scan for {:?}", config.name_prefix),
    };
    CheckResult::new(
        "config",
        CheckStatus::Info,
        format!("{source}; {target}, channel {}", config.channel),
    )
}

fn adapters_check(sysfs: &Path) -> CheckResult {
    let entries = match std::fs::read_dir(sysfs) {
        Ok(entries) => entries,
        Err(err) => {
            return CheckResult::new(
                "adapters",
                CheckStatus::Warn,
                format!("{}: {err}", sysfs.display()),
            )
        }
    };

    let mut adapters: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("hci") && !name.contains(':'))
        .collect();
    adapters.sort();

    if adapters.is_empty() {
        CheckResult::new("adapters", CheckStatus::Fail, "no hci adapters present")
    } else {
        CheckResult::new("adapters", CheckStatus::Pass, adapters.join(", "))
    }
}

fn hci_device_check(config: &ClientConfig) -> CheckResult {
    let scanner = config.scan.scanner();
    match scanner.probe() {
        Ok(()) => CheckResult::new(
            "hci_device",
            CheckStatus::Pass,
            format!("hci{} available for discovery", scanner.dev_id()),
        ),
        Err(TransportError::Unsupported(reason)) => {
            CheckResult::new("hci_device", CheckStatus::Skip, reason)
        }
        Err(err) if config.explicit_address().is_some() => CheckResult::new(
            "hci_device",
            CheckStatus::Warn,
            format!("hci{}: {err} (not needed with a fixed address)", scanner.dev_id()),
        ),
        Err(err) => CheckResult::new(
            "hci_device",
            CheckStatus::Fail,
            format!("hci{}: {err}", scanner.dev_id()),
        ),
    }
}

fn rfcomm_socket_check() -> CheckResult {
    match rfcomm::probe() {
        Ok(()) => CheckResult::new("rfcomm_socket", CheckStatus::Pass, "socket created"),
        Err(TransportError::Unsupported(reason)) => {
            CheckResult::new("rfcomm_socket", CheckStatus::Skip, reason)
        }
        Err(err) => CheckResult::new("rfcomm_socket", CheckStatus::Fail, err.to_string()),
    }
}
