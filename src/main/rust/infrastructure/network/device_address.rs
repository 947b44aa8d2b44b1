use std::net::IpAddr;

use crate::domain::errors::{DomainError, Result};

/// Address other hosts can reach this device on, preferring IPv4
pub fn resolve_device_address() -> Result<IpAddr> {
    match local_ip_address::local_ip() {
        Ok(addr) => Ok(addr),
        Err(v4_err) => local_ip_address::local_ipv6()
            .map_err(|_| DomainError::DeviceAddressUnavailable(v4_err.to_string())),
    }
}
