//! Host address enumeration.
//!
//! Provides platform-specific listing of interface addresses and the
//! selection rules that turn that list into an IPv4 or IPv6 hint. The hint is
//! diagnostic only: the resolver scans both tables regardless.

#[cfg(unix)]
mod unix;

use std::net::{IpAddr, Ipv4Addr};

use serde::Serialize;

use crate::error::InterfaceError;

/// One address bound to a host interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceAddress {
    /// Interface name (e.g. `eth0`).
    pub interface: String,
    pub address: IpAddr,
    /// IPv6 scope id; 0 when unscoped or IPv4.
    pub scope_id: u32,
}

impl InterfaceAddress {
    /// Textual form; scoped IPv6 addresses carry a `%interface` zone suffix.
    pub fn text(&self) -> String {
        match self.address {
            IpAddr::V6(v6) if self.scope_id != 0 => format!("{v6}%{}", self.interface),
            other => other.to_string(),
        }
    }
}

/// Preferred addresses per family; empty when the family is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressHints {
    pub ipv4: String,
    pub ipv6: String,
}

impl AddressHints {
    pub fn from_addresses(addresses: &[InterfaceAddress]) -> Self {
        Self {
            ipv4: select_address(addresses, true),
            ipv6: select_address(addresses, false),
        }
    }

    pub fn has_ipv6(&self) -> bool {
        !self.ipv6.is_empty()
    }
}

/// Returns every address bound to every interface on the host.
pub fn local_addresses() -> Result<Vec<InterfaceAddress>, InterfaceError> {
    #[cfg(unix)]
    {
        unix::local_addresses()
    }

    #[cfg(not(unix))]
    {
        Err(InterfaceError::PlatformNotSupported)
    }
}

/// Returns the first usable non-loopback address of the requested family.
///
/// An empty string means no address of that family qualifies.
pub fn list_local_addresses(prefer_ipv4: bool) -> Result<String, InterfaceError> {
    Ok(select_address(&local_addresses()?, prefer_ipv4))
}

/// Applies the selection rules to an address list.
///
/// IPv4 is recognised by its text. For IPv6, link-local (`fe80`) addresses are
/// skipped and the zone suffix is dropped.
pub fn select_address<'a, I>(addresses: I, prefer_ipv4: bool) -> String
where
    I: IntoIterator<Item = &'a InterfaceAddress>,
{
    for addr in addresses {
        if addr.address.is_loopback() {
            continue;
        }

        let text = addr.text();
        let is_ipv4 = text.parse::<Ipv4Addr>().is_ok();

        if prefer_ipv4 {
            if is_ipv4 {
                return text;
            }
        } else if !is_ipv4 {
            if is_link_local(&text) {
                continue;
            }
            return strip_zone(&text).to_string();
        }
    }

    String::new()
}

fn is_link_local(text: &str) -> bool {
    text.get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("fe80"))
}

fn strip_zone(text: &str) -> &str {
    match text.find('%') {
        Some(delim) => &text[..delim],
        None => text,
    }
}
