use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the originating client address of a request.
///
/// Trusted proxy headers are consulted in configured order; the transport
/// peer address is the fallback. Only configure headers that the fronting
/// proxy overwrites, otherwise clients can spoof their address.
#[derive(Debug, Clone, Default)]
pub struct RealIpResolver {
    trusted_headers: Vec<String>,
    use_leftmost_ip: bool,
}

impl RealIpResolver {
    pub fn new(trusted_headers: Vec<String>, use_leftmost_ip: bool) -> Self {
        Self {
            trusted_headers,
            use_leftmost_ip,
        }
    }

    /// Real client address of the request in canonical text form, or an empty
    /// string if none is known
    pub fn resolve(&self, request: &Request) -> String {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        self.resolve_parts(request.headers(), peer)
    }

    pub fn resolve_parts(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        for name in &self.trusted_headers {
            if let Some(ip) = self.from_header(headers, name) {
                return ip;
            }
        }

        peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
    }

    fn from_header(&self, headers: &HeaderMap, name: &str) -> Option<String> {
        // The last occurrence is the one appended by the closest proxy
        let value = headers.get_all(name).iter().last()?.to_str().ok()?;

        // Entries that are not addresses ("unknown", obfuscated ids) are skipped
        let mut entries = value.split(',').filter_map(|ip| ip.trim().parse::<IpAddr>().ok());
        let found = if self.use_leftmost_ip {
            entries.next()
        } else {
            entries.next_back()
        };

        found.map(|ip| ip.to_string())
    }
}
