use std::time::Duration;

use mossbrain_transport::{HciScanner, DEFAULT_CHANNEL};
use serde::{Deserialize, Serialize};

/// Name prefix that identifies brain blocks during discovery.
pub const DEFAULT_NAME_PREFIX: &str = "Moss";

/// Discovery settings for the HCI scanner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Local adapter index (`hciN`).
    pub hci_dev: u16,
    /// Inquiry length in units of 1.28 s.
    pub inquiry_length: u8,
    /// Maximum inquiry responses (0 means unlimited).
    pub max_responses: u8,
    /// Drop cached inquiry results before scanning.
    pub flush_cache: bool,
    /// Remote name request timeout per device.
    pub name_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            hci_dev: 0,
            inquiry_length: 8,
            max_responses: 255,
            flush_cache: true,
            name_timeout_ms: 10_000,
        }
    }
}

impl ScanConfig {
    pub fn name_timeout(&self) -> Duration {
        Duration::from_millis(self.name_timeout_ms)
    }

    /// Build a scanner with these settings.
    pub fn scanner(&self) -> HciScanner {
        HciScanner::new(self.hci_dev)
            .with_inquiry_length(self.inquiry_length)
            .with_max_responses(self.max_responses)
            .with_flush_cache(self.flush_cache)
            .with_name_timeout(self.name_timeout())
    }
}

/// Client session settings.
///
/// Loaded from JSON with every field optional; absent fields take defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Device address. Discovery runs when unset or empty.
    pub address: Option<String>,
    /// RFCOMM channel.
    pub channel: u8,
    /// Device name prefix matched during discovery.
    pub name_prefix: String,
    pub scan: ScanConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: None,
            channel: DEFAULT_CHANNEL,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            scan: ScanConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// The configured address, treating an empty string as unset.
    pub fn explicit_address(&self) -> Option<&str> {
        self.address.as_deref().filter(|address| !address.is_empty())
    }
}
