//! Resolution of the console's address.

use easyerr::Error;
use std::net::{AddrParseError, Ipv4Addr};

/// Environment variable holding the fallback address of the console.
pub const ADDRESS_VAR: &str = "WII";

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("no destination configured: pass an address or set the WII variable")]
    Unconfigured,
    #[error("invalid address {address:?} (only IPv4 is supported)")]
    Invalid {
        address: String,
        source: AddrParseError,
    },
}

/// Reads the fallback address from the process environment.
pub fn fallback_from_env() -> Option<String> {
    std::env::var(ADDRESS_VAR).ok()
}

/// Resolves the address of the console. An explicit, non-empty address takes priority over the
/// fallback.
pub fn resolve(explicit: Option<&str>, fallback: Option<&str>) -> Result<Ipv4Addr, AddressError> {
    let address = explicit
        .filter(|s| !s.is_empty())
        .or(fallback.filter(|s| !s.is_empty()))
        .ok_or(AddressError::Unconfigured)?;

    let parsed = address
        .parse::<Ipv4Addr>()
        .map_err(|source| AddressError::Invalid {
            address: address.to_owned(),
            source,
        })?;

    tracing::debug!("resolved console address {parsed}");
    Ok(parsed)
}
