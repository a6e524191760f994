use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tokio::fs;

/// The probe input: built once from the command line before any
/// resolution happens, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub host: String,
    pub service: String,
    pub timeout: Duration,
}

impl ProbeTarget {
    pub fn new(host: String, service: String, timeout_secs: u64) -> Result<Self> {
        if host.is_empty() {
            bail!("host must be non-empty");
        }
        if service.is_empty() {
            bail!("service must be non-empty");
        }
        if timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        Ok(ProbeTarget {
            host,
            service,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// One entry of a `--targets` batch file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TargetEntry {
    pub host: String,
    pub service: String,
}

/// Load the batch-target file: a JSON array of host/service pairs.
pub async fn load_targets(path: &Path) -> Result<Vec<TargetEntry>> {
    if !path.exists() {
        bail!("targets file not found: {}", path.display());
    }
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<TargetEntry> = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    if entries.is_empty() {
        bail!("targets file {} contains no entries", path.display());
    }
    Ok(entries)
}

/// Map a log-level string to a tracing::Level.
pub fn tracing_level(level: &str) -> Result<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" | "warning" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels are: trace, debug, info, warn, error",
            level
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_target_rejects_bad_input() {
        assert!(ProbeTarget::new(String::new(), "80".into(), 3).is_err());
        assert!(ProbeTarget::new("localhost".into(), String::new(), 3).is_err());
        assert!(ProbeTarget::new("localhost".into(), "80".into(), 0).is_err());

        let t = ProbeTarget::new("localhost".into(), "80".into(), 3).unwrap();
        assert_eq!(t.timeout, Duration::from_secs(3));
    }

    #[test]
    fn target_entries_parse_from_json() {
        let entries: Vec<TargetEntry> = serde_json::from_str(
            r#"[{"host": "127.0.0.1", "service": "22"}, {"host": "localhost", "service": "http"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].host, "127.0.0.1");
        assert_eq!(entries[1].service, "http");
    }

    #[tokio::test]
    async fn load_targets_reports_missing_and_empty_files() {
        let missing = Path::new("/nonexistent/targets.json");
        assert!(load_targets(missing).await.is_err());

        let dir = std::env::temp_dir().join(format!("reach-probe-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let empty = dir.join("empty.json");
        tokio::fs::write(&empty, "[]").await.unwrap();
        assert!(load_targets(&empty).await.is_err());

        let good = dir.join("targets.json");
        tokio::fs::write(&good, r#"[{"host": "127.0.0.1", "service": "1"}]"#)
            .await
            .unwrap();
        let entries = load_targets(&good).await.unwrap();
        assert_eq!(entries.len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn log_levels_map_like_the_config_string() {
        assert_eq!(tracing_level("info").unwrap(), tracing::Level::INFO);
        assert_eq!(tracing_level("WARN").unwrap(), tracing::Level::WARN);
        assert!(tracing_level("loud").is_err());
    }
}
