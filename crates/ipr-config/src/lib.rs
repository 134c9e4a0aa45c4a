use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Runtime settings, read from environment variables (the CLI loads `.env`
/// first via dotenvy).
///
/// Required:
///   REGISTRY_TOKEN       - API token for the allocation registry
/// Optional:
///   REGISTRY_URL         - registry base URL (default http://localhost:8000)
///   DEVICE_USERNAME      - SSH username for probes (default admin)
///   DEVICE_SSH_OPTS      - extra ssh args, whitespace-separated
///   PROBE_TIMEOUT_SECS   - per-device budget (default 20)
///   PROBE_MAX_IN_FLIGHT  - device fan-out bound (default 4)
///   IPR_STATE_DIR        - approval store + audit log directory (default state)
#[derive(Clone, Debug)]
pub struct Settings {
    pub registry_url: String,
    pub registry_token: String,
    pub device_username: String,
    pub device_ssh_opts: Vec<String>,
    pub probe_timeout: Duration,
    pub probe_max_in_flight: usize,
    pub state_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let registry_token = match std::env::var("REGISTRY_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => bail!("REGISTRY_TOKEN is not set; the registry requires token auth"),
        };

        let probe_timeout_secs: u64 = var_or("PROBE_TIMEOUT_SECS", "20")
            .parse()
            .context("PROBE_TIMEOUT_SECS must be an integer number of seconds")?;
        let probe_max_in_flight: usize = var_or("PROBE_MAX_IN_FLIGHT", "4")
            .parse()
            .context("PROBE_MAX_IN_FLIGHT must be a positive integer")?;

        Ok(Self {
            registry_url: var_or("REGISTRY_URL", "http://localhost:8000"),
            registry_token,
            device_username: var_or("DEVICE_USERNAME", "admin"),
            device_ssh_opts: var_or("DEVICE_SSH_OPTS", "")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            probe_timeout: Duration::from_secs(probe_timeout_secs),
            probe_max_in_flight: probe_max_in_flight.max(1),
            state_dir: PathBuf::from(var_or("IPR_STATE_DIR", "state")),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Settings rendered for logs: the token never appears.
impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "registry_url={} registry_token=*** device_username={} probe_timeout_secs={} \
             probe_max_in_flight={} state_dir={}",
            self.registry_url,
            self.device_username,
            self.probe_timeout.as_secs(),
            self.probe_max_in_flight,
            self.state_dir.display()
        )
    }
}
