use mossbrain_client::{ClientConfig, DeviceLocator};

use crate::cmd::ScanArgs;
use crate::exit::{client_error, CliResult, DEVICE_NOT_FOUND, SUCCESS};
use crate::output::{print_devices, OutputFormat};
use crate::settings::Settings;

pub fn run(args: ScanArgs, settings: &Settings, format: OutputFormat) -> CliResult<i32> {
    let config = apply_overrides(settings.client_config()?, &args);

    let mut locator =
        DeviceLocator::new(config.scan.scanner()).with_prefix(config.name_prefix.clone());
    let devices = locator
        .scan()
        .map_err(|err| client_error("scan failed", err))?;

    print_devices(
        &devices,
        locator.prefix(),
        |name| locator.matches(name),
        format,
    );

    if devices.iter().any(|device| locator.matches(&device.name)) {
        Ok(SUCCESS)
    } else {
        Ok(DEVICE_NOT_FOUND)
    }
}

fn apply_overrides(mut config: ClientConfig, args: &ScanArgs) -> ClientConfig {
    if let Some(prefix) = &args.prefix {
        config.name_prefix = prefix.clone();
    }
    if let Some(hci_dev) = args.hci_dev {
        config.scan.hci_dev = hci_dev;
    }
    if let Some(inquiry_length) = args.inquiry_length {
        config.scan.inquiry_length = inquiry_length;
    }
    config
}
