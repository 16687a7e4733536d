// Address literal checks (no DNS, no errors surfaced)

use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

/// Classify `addr` as an IPv4 or IPv6 literal, IPv4 first.
///
/// IPv4 is strict: exactly four decimal octets. Shorthand forms accepted by
/// `inet_aton` (`127.1`, `2130706433`, `0x7f.0.0.1`) are not address literals here.
pub fn classify_address(addr: &str) -> Option<AddressFamily> {
    if addr.parse::<Ipv4Addr>().is_ok() {
        return Some(AddressFamily::V4);
    }
    if addr.parse::<Ipv6Addr>().is_ok() {
        return Some(AddressFamily::V6);
    }
    None
}

/// True if `addr` is an IPv4 or IPv6 literal rather than a hostname
pub fn is_ip_address(addr: &str) -> bool {
    classify_address(addr).is_some()
}
