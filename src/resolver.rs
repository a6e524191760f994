use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result, anyhow, bail};
use socket2::{Domain, Protocol, SockAddr, Type};
use tracing::debug;

use crate::util::{is_numeric_service, lookup_service_port};

/// One resolved connection target. Built in bulk by `resolve`,
/// immutable afterwards; the connector only reads it.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub domain: Domain,
    pub socket_type: Type,
    pub protocol: Protocol,
    pub addr: SockAddr,
    /// Human-readable host for report lines: the input literal when
    /// numeric resolution produced this endpoint, otherwise the
    /// numeric form of the resolved address.
    pub display_host: String,
    pub display_service: String,
}

impl Endpoint {
    fn from_socket_addr(addr: SocketAddr, display_host: String, display_service: String) -> Self {
        Endpoint {
            domain: Domain::for_address(addr),
            socket_type: Type::STREAM,
            protocol: Protocol::TCP,
            addr: SockAddr::from(addr),
            display_host,
            display_service,
        }
    }
}

/// Resolve `(host, service)` into an ordered list of endpoints.
///
/// Numeric-first: an IP-literal host together with an all-digit
/// service skips DNS entirely. Otherwise the name-based fallback
/// runs. The two phases never mix results, and endpoint order is the
/// resolver's order unchanged (no dedup, no family preference).
pub async fn resolve(host: &str, service: &str) -> Result<Vec<Endpoint>> {
    if host.is_empty() || service.is_empty() {
        bail!("host and service must be non-empty");
    }

    if let Some(endpoints) = resolve_numeric(host, service) {
        debug!("{host}:{service} resolved numerically, no lookup");
        return Ok(endpoints);
    }
    resolve_by_name(host, service).await
}

/// Phase 1: numeric literals only. No DNS, no services(5) lookup; the
/// display strings are the inputs verbatim.
fn resolve_numeric(host: &str, service: &str) -> Option<Vec<Endpoint>> {
    let ip: IpAddr = host.parse().ok()?;
    if !is_numeric_service(service) {
        return None;
    }
    let port: u16 = service.parse().ok()?;
    let endpoint = Endpoint::from_socket_addr(
        SocketAddr::new(ip, port),
        host.to_string(),
        service.to_string(),
    );
    Some(vec![endpoint])
}

/// Phase 2: name resolution. An all-digit service is still parsed as
/// a port (never looked up by name); the host always goes through the
/// system resolver. Display strings are the numeric rendering of each
/// resolved address.
async fn resolve_by_name(host: &str, service: &str) -> Result<Vec<Endpoint>> {
    let port = if is_numeric_service(service) {
        service
            .parse::<u16>()
            .with_context(|| format!("service {service:?} is not a valid port"))?
    } else {
        lookup_service_port(service)
            .ok_or_else(|| anyhow!("unknown service name {service:?}"))?
    };

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving {host}:{service}"))?;

    let endpoints: Vec<Endpoint> = addrs
        .map(|addr| {
            Endpoint::from_socket_addr(addr, addr.ip().to_string(), addr.port().to_string())
        })
        .collect();
    if endpoints.is_empty() {
        bail!("no addresses found for {host}:{service}");
    }
    debug!(
        "{host}:{service} resolved by name to {} address(es)",
        endpoints.len()
    );
    Ok(endpoints)
}
