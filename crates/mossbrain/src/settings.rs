use std::io;
use std::path::{Path, PathBuf};

use mossbrain_client::ClientConfig;

use crate::exit::{CliError, CliResult, DATA_INVALID, PERMISSION_DENIED, USAGE};

/// Where the session configuration comes from.
///
/// Loaded on demand so commands that never touch a device ignore a broken
/// config file.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub config_path: Option<PathBuf>,
    pub address: Option<String>,
}

impl Settings {
    /// File values first, then command-line overrides.
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let mut config = match &self.config_path {
            Some(path) => load_config(path)?,
            None => ClientConfig::default(),
        };
        if let Some(address) = self.address.as_deref().filter(|a| !a.is_empty()) {
            config = config.with_address(address);
        }
        Ok(config)
    }
}

fn load_config(path: &Path) -> CliResult<ClientConfig> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        let code = match err.kind() {
            io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
            _ => USAGE,
        };
        CliError::new(code, format!("failed reading {}: {err}", path.display()))
    })?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("invalid config {}: {err}", path.display()),
        )
    })
}
