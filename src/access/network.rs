use ipnet::IpNet;
use once_cell::sync::Lazy;
use std::net::IpAddr;

/// CIDR blocks that always count as internal traffic.
///
/// The first entry is the platform 6PN mesh; the rest are the RFC 1918 IPv4
/// blocks and the IPv6 unique-local range.
const PRIVATE_CIDRS: [&str; 5] = [
    "fdaa::/48",
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "fc00::/7",
];

/// Parsed form of the private-network table, built once per process
pub static PRIVATE_NETWORKS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    PRIVATE_CIDRS
        .iter()
        .filter_map(|cidr| cidr.parse::<IpNet>().ok())
        .collect()
});

/// Unwrap IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) so they match IPv4 ranges
pub fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Check whether a parsed address belongs to the private-network table
pub fn is_private_addr(ip: &IpAddr) -> bool {
    let ip = canonical(*ip);
    PRIVATE_NETWORKS.iter().any(|net| net.contains(&ip))
}

/// Check whether a raw address string is a private address.
/// Unparsable input is never private.
pub fn is_private_network(ip: &str) -> bool {
    ip.parse::<IpAddr>()
        .map(|addr| is_private_addr(&addr))
        .unwrap_or(false)
}
