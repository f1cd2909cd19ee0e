use mossbrain_transport::{Connect, Discover, RfcommConnector, RfcommStream};

use crate::client::BrainClient;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::Result;
use crate::locator::DeviceLocator;

/// Find (if needed), connect to and reset a brain block over RFCOMM.
pub fn connect(config: &ClientConfig) -> Result<BrainClient<RfcommStream>> {
    let mut locator =
        DeviceLocator::new(config.scan.scanner()).with_prefix(config.name_prefix.clone());
    connect_with(config, &mut locator, &mut RfcommConnector)
}

/// Connect with explicit discovery and transport implementations.
///
/// A failed connect returns without any reset attempt. A failed initial
/// reset tears the session down before returning.
pub fn connect_with<D, C>(
    config: &ClientConfig,
    locator: &mut DeviceLocator<D>,
    connector: &mut C,
) -> Result<BrainClient<C::Stream>>
where
    D: Discover,
    C: Connect,
{
    let address = locator.resolve(config.explicit_address().unwrap_or_default())?;
    let conn = Connection::open(connector, &address, config.channel)?;
    BrainClient::init(conn)
}
