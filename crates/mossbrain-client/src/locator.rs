use mossbrain_transport::{DiscoveredDevice, Discover};
use tracing::debug;

use crate::config::DEFAULT_NAME_PREFIX;
use crate::error::{ClientError, Result};

/// Resolves the address of the device to talk to.
pub struct DeviceLocator<D> {
    discoverer: D,
    prefix: String,
}

impl<D: Discover> DeviceLocator<D> {
    pub fn new(discoverer: D) -> Self {
        Self {
            discoverer,
            prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }

    /// Override the device name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a discovered name belongs to the device family.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Run one discovery pass and return everything found.
    pub fn scan(&mut self) -> Result<Vec<DiscoveredDevice>> {
        debug!("scanning");
        let devices = self.discoverer.discover()?;
        for device in &devices {
            debug!(address = %device.address, name = %device.name, "discovered");
        }
        Ok(devices)
    }

    /// Return `explicit` unchanged when non-empty; otherwise scan and pick
    /// the first device whose name has the prefix.
    pub fn resolve(&mut self, explicit: &str) -> Result<String> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }

        self.scan()?
            .into_iter()
            .find(|device| self.matches(&device.name))
            .map(|device| device.address)
            .ok_or_else(|| ClientError::DeviceNotFound {
                prefix: self.prefix.clone(),
            })
    }

    pub fn into_inner(self) -> D {
        self.discoverer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDiscover;

    #[test]
    fn explicit_address_skips_discovery() {
        let mut locator = DeviceLocator::new(MockDiscover::new(&[("BB", "Moss-X1")]));
        let address = locator
            .resolve("00:11:22:33:44:55")
            .expect("explicit address should resolve");

        assert_eq!(address, "00:11:22:33:44:55");
        assert_eq!(locator.into_inner().scans, 0);
    }

    #[test]
    fn scan_picks_first_prefix_match() {
        let mut locator =
            DeviceLocator::new(MockDiscover::new(&[("AA", "Other"), ("BB", "Moss-X1")]));
        assert_eq!(locator.resolve("").expect("scan should find BB"), "BB");
    }

    #[test]
    fn scan_keeps_platform_order() {
        let mut locator = DeviceLocator::new(MockDiscover::new(&[
            ("CC", "Moss-2"),
            ("AA", "Other"),
            ("BB", "Moss-1"),
        ]));
        assert_eq!(locator.resolve("").expect("scan should find CC"), "CC");
    }

    #[test]
    fn no_match_is_device_not_found() {
        let mut locator = DeviceLocator::new(MockDiscover::new(&[("AA", "Other"), ("BB", "")]));
        let err = locator.resolve("").expect_err("no device should match");
        assert!(matches!(err, ClientError::DeviceNotFound { prefix } if prefix == "Moss"));
    }

    #[test]
    fn custom_prefix() {
        let mut locator =
            DeviceLocator::new(MockDiscover::new(&[("AA", "Other"), ("BB", "Moss-X1")]))
                .with_prefix("Oth");
        assert_eq!(locator.prefix(), "Oth");
        assert_eq!(locator.resolve("").expect("scan should find AA"), "AA");
    }
}
