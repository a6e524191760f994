use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::ProbeTarget;
use crate::prober::{ProbeStatus, tcp_connect};
use crate::resolver::{self, Endpoint};

/// Run one probing pass over everything the target resolves to.
///
/// Resolution happens once; a resolution failure aborts with no
/// partial probing. Endpoints are then probed strictly sequentially —
/// each attempt finishes, socket closed, before the next begins — and
/// each report line is printed as its attempt completes. Per-endpoint
/// failures are contained: they are reported and the pass continues.
pub async fn run(target: &ProbeTarget) -> Result<Vec<(Endpoint, ProbeStatus)>> {
    let endpoints = resolver::resolve(&target.host, &target.service)
        .await
        .with_context(|| format!("cannot resolve {}:{}", target.host, target.service))?;
    debug!(
        "probing {} endpoint(s) for {}:{} with timeout {:?}",
        endpoints.len(),
        target.host,
        target.service,
        target.timeout
    );

    let mut results = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let outcome = tcp_connect::connect_with_timeout(&endpoint, target.timeout).await;
        // into_status closes the connected stream, so no socket from
        // this attempt outlives its report line.
        let status = outcome.into_status();
        println!(
            "connect {}:{}  {}",
            endpoint.display_host,
            endpoint.display_service,
            status.report()
        );
        if let ProbeStatus::ResourceError(e) = &status {
            warn!(
                "local failure probing {}:{}: {}",
                endpoint.display_host, endpoint.display_service, e
            );
        }
        results.push((endpoint, status));
    }
    Ok(results)
}
