//! Interface enumeration through `getifaddrs(3)`.

use std::ffi::CStr;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ptr;

use libc::{c_int, ifaddrs, sockaddr_in, sockaddr_in6, AF_INET, AF_INET6};

use crate::error::InterfaceError;
use crate::netif::InterfaceAddress;

/// Owns the list returned by `getifaddrs` and frees it on drop.
struct IfAddrs(*mut ifaddrs);

impl Drop for IfAddrs {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { libc::freeifaddrs(self.0) };
        }
    }
}

/// Lists every IPv4/IPv6 address of every interface, in kernel order.
pub fn local_addresses() -> Result<Vec<InterfaceAddress>, InterfaceError> {
    let mut head: *mut ifaddrs = ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(InterfaceError::EnumerationFailed(io::Error::last_os_error()));
    }
    let list = IfAddrs(head);

    let mut addresses = Vec::new();
    let mut cursor = list.0;
    while !cursor.is_null() {
        // The list stays alive until `list` drops at the end of this function.
        let entry = unsafe { &*cursor };
        if let Some(address) = unsafe { interface_address(entry) } {
            addresses.push(address);
        }
        cursor = entry.ifa_next;
    }

    Ok(addresses)
}

/// Converts one list entry; entries without an IP address are skipped.
///
/// # Safety
///
/// `entry` must come from a live `getifaddrs` list.
unsafe fn interface_address(entry: &ifaddrs) -> Option<InterfaceAddress> {
    if entry.ifa_addr.is_null() {
        return None;
    }

    let interface = if entry.ifa_name.is_null() {
        String::new()
    } else {
        CStr::from_ptr(entry.ifa_name).to_string_lossy().into_owned()
    };

    match c_int::from((*entry.ifa_addr).sa_family) {
        AF_INET => {
            let sin = &*(entry.ifa_addr as *const sockaddr_in);
            Some(InterfaceAddress {
                interface,
                address: IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))),
                scope_id: 0,
            })
        }
        AF_INET6 => {
            let sin6 = &*(entry.ifa_addr as *const sockaddr_in6);
            Some(InterfaceAddress {
                interface,
                address: IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)),
                scope_id: sin6.sin6_scope_id,
            })
        }
        _ => None,
    }
}
