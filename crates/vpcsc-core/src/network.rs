//! # Caller IP Classification
//!
//! Decides whether a caller IP taken from an audit log is a globally routable
//! (public internet) address. Only public callers can be bound to a new
//! access level, and only public-sourced external ingress requires a
//! justification token.
//!
//! Audit logs use sentinel strings instead of addresses for traffic that
//! never left the provider's network (`"private"`, `"gce-internal-ip"`).
//! Those, the empty string, and anything unparsable classify as not public;
//! none of them is an error.
//!
//! The ranges excluded here follow the IANA special-purpose address
//! registries for IPv4 and IPv6.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Sentinel values some log producers emit in place of an address.
const SENTINELS: &[&str] = &["private", "gce-internal-ip"];

/// Returns `true` only for a syntactically valid, globally routable address.
pub fn is_public_ip(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() || SENTINELS.iter().any(|s| trimmed.eq_ignore_ascii_case(s)) {
        return false;
    }
    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_global_v4(v4),
        Ok(IpAddr::V6(v6)) => is_global_v6(v6),
        Err(_) => false,
    }
}

fn is_global_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, d] = ip.octets();
    let this_network = a == 0;
    let shared = a == 100 && (b & 0b1100_0000) == 64;
    // 192.0.0.9 and 192.0.0.10 are the two globally reachable anycast
    // assignments inside 192.0.0.0/24.
    let protocol_assignment = a == 192 && b == 0 && c == 0 && d != 9 && d != 10;
    let benchmarking = a == 198 && (b & 0xfe) == 18;
    let reserved = a >= 240;

    !(this_network
        || ip.is_private()
        || shared
        || ip.is_loopback()
        || ip.is_link_local()
        || protocol_assignment
        || ip.is_documentation()
        || benchmarking
        || reserved
        || ip.is_multicast()
        || ip.is_broadcast())
}

fn is_global_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_global_v4(mapped);
    }
    let s = ip.segments();
    let local_translation = s[0] == 0x64 && s[1] == 0xff9b && s[2] == 1;
    let discard_only = s[0] == 0x100 && s[1] == 0 && s[2] == 0 && s[3] == 0;
    let ietf_assignment = s[0] == 0x2001 && s[1] < 0x200 && !is_global_ietf_assignment(&s);
    let documentation = (s[0] == 0x2001 && s[1] == 0xdb8) || (s[0] & 0xfff0) == 0x3ff0;
    let unique_local = (s[0] & 0xfe00) == 0xfc00;
    let link_local = (s[0] & 0xffc0) == 0xfe80;

    !(ip.is_unspecified()
        || ip.is_loopback()
        || local_translation
        || discard_only
        || ietf_assignment
        || documentation
        || unique_local
        || link_local
        || ip.is_multicast())
}

/// Globally reachable exceptions inside 2001::/23.
fn is_global_ietf_assignment(s: &[u16; 8]) -> bool {
    let port_control = s[1] == 1 && s[2..7].iter().all(|x| *x == 0) && (s[7] == 1 || s[7] == 2);
    let amt = s[1] == 3;
    let as112 = s[1] == 4 && s[2] == 0x112;
    let orchid_v2 = (0x20..=0x2f).contains(&s[1]);
    port_control || amt || as112 || orchid_v2
}
