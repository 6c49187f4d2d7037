//! Pure routing decisions: subdomain extraction and port lookup

use crate::config::Config;

/// Where a request should go, decided purely from the configuration and
/// the request's Host header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve the configured home message (no root port mapped)
    Home,
    /// Proxy to the local backend on this port
    Forward(u16),
    /// Unknown subdomain, or a host outside the configured base domain
    Invalid,
}

/// Extract the subdomain labels preceding `base_host` from a Host header.
///
/// Returns `Some("")` for the bare base host, `Some("a.b")` for
/// `a.b.<base_host>`, and `None` when the host does not belong to the
/// configured base domain at all. An absent or empty Host header is
/// treated as the bare base host. Comparison is case-insensitive and a
/// `:port` suffix on the header is ignored.
pub fn parse_subdomain(base_host: &str, full_host: &str) -> Option<String> {
    let host = full_host
        .split(':')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let base = base_host.to_ascii_lowercase();

    if host.is_empty() || host == base {
        return Some(String::new());
    }

    // "a.b.example.com" must end in ".example.com"; a mere suffix match
    // would accept hosts like "notexample.com"
    host.strip_suffix(&base)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .map(String::from)
}

/// Decide how to handle a request with the given Host header.
///
/// Lookup order: explicit subdomain mapping, then the fallback port, then
/// the direct home/invalid responses. Reads nothing but the configuration
/// and writes nothing.
pub fn route(config: &Config, host_header: &str) -> RouteDecision {
    let Some(subdomain) = parse_subdomain(&config.host, host_header) else {
        return RouteDecision::Invalid;
    };

    if let Some(&port) = config.subdomains.get(&subdomain) {
        return RouteDecision::Forward(port);
    }

    if let Some(port) = config.fallback_port {
        return RouteDecision::Forward(port);
    }

    if subdomain.is_empty() {
        RouteDecision::Home
    } else {
        RouteDecision::Invalid
    }
}
