mod config;
mod driver;
mod prober;
mod resolver;
mod util;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::error;

use config::ProbeTarget;

/// Probe whether a host accepts TCP connections on a service/port.
#[derive(Debug, Parser)]
#[command(name = "reach-probe", version)]
struct Cli {
    /// Host to probe: IPv4/IPv6 literal or domain name.
    #[arg(required_unless_present = "targets", conflicts_with = "targets")]
    host: Option<String>,

    /// Service to probe: numeric port or service name.
    #[arg(required_unless_present = "targets", conflicts_with = "targets")]
    service: Option<String>,

    /// Connect timeout in whole seconds.
    #[arg(short = 't', long, default_value_t = 3,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// JSON file with a list of {"host", "service"} targets to probe
    /// instead of the positional pair.
    #[arg(long, value_name = "FILE")]
    targets: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = config::tracing_level(&cli.log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                format!("reach_probe={}", log_level.as_str().to_lowercase()).parse()?,
            ),
        )
        .init();

    match cli.targets {
        Some(path) => run_batch(&path, cli.timeout).await,
        None => {
            let (host, service) = match (cli.host, cli.service) {
                (Some(host), Some(service)) => (host, service),
                // required_unless_present enforces both positionals
                // whenever --targets is absent.
                _ => unreachable!("clap requires host and service without --targets"),
            };
            let target = ProbeTarget::new(host, service, cli.timeout)?;
            driver::run(&target).await?;
            Ok(())
        }
    }
}

/// Probe every entry of the batch file with the shared timeout. An
/// invalid or unresolvable entry is reported and the run moves on to
/// the next one; the run only fails when no entry resolved at all.
async fn run_batch(path: &Path, timeout_secs: u64) -> anyhow::Result<()> {
    let entries = config::load_targets(path).await?;
    let mut resolved_any = false;
    for entry in entries {
        let result = match ProbeTarget::new(entry.host.clone(), entry.service.clone(), timeout_secs)
        {
            Ok(target) => driver::run(&target).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => resolved_any = true,
            Err(e) => {
                error!("skipping {}:{}: {e:#}", entry.host, entry.service);
                eprintln!("reach-probe: {e:#}");
            }
        }
    }
    if !resolved_any {
        anyhow::bail!("no target in {} could be resolved", path.display());
    }
    Ok(())
}
