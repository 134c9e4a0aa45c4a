use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Probe failures, scoped to the device they occurred on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeError {
    Unreachable { device: String, detail: String },
    Timeout { device: String, secs: u64 },
    CommandFailed { device: String, detail: String },
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Unreachable { device, detail } => {
                write!(f, "device {device} unreachable: {detail}")
            }
            ProbeError::Timeout { device, secs } => {
                write!(f, "device {device} timed out after {secs}s")
            }
            ProbeError::CommandFailed { device, detail } => {
                write!(f, "command failed on {device}: {detail}")
            }
        }
    }
}

impl std::error::Error for ProbeError {}

/// How a CLI command reaches a device. Injected so collectors can be tested
/// with canned output and so deployments can swap the access method.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn run_command(&self, device: &str, command: &str) -> Result<String, ProbeError>;
}

/// Transport that shells out to the system `ssh` binary.
///
/// BatchMode is forced: the probe runs unattended, so key-based auth is the
/// only supported mode and a password prompt must fail fast instead of
/// hanging the run.
pub struct SshTransport {
    username: String,
    extra_opts: Vec<String>,
    timeout: Duration,
}

impl SshTransport {
    pub fn new(username: impl Into<String>, timeout: Duration) -> Self {
        Self {
            username: username.into(),
            extra_opts: Vec::new(),
            timeout,
        }
    }

    /// Additional `-o` style arguments, passed through verbatim.
    pub fn with_extra_opts(mut self, opts: Vec<String>) -> Self {
        self.extra_opts = opts;
        self
    }
}

#[async_trait]
impl DeviceTransport for SshTransport {
    async fn run_command(&self, device: &str, command: &str) -> Result<String, ProbeError> {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .arg("-o")
            .arg("ConnectTimeout=10");
        for opt in &self.extra_opts {
            cmd.arg(opt);
        }
        cmd.arg(format!("{}@{}", self.username, device));
        cmd.arg(command);
        cmd.kill_on_drop(true);

        debug!(device, command, "running probe command");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                device: device.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ProbeError::Unreachable {
                device: device.to_string(),
                detail: format!("spawn ssh: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // ssh reserves 255 for connection/auth failures; anything else
            // came from the remote command itself.
            return Err(if output.status.code() == Some(255) {
                ProbeError::Unreachable {
                    device: device.to_string(),
                    detail: stderr,
                }
            } else {
                ProbeError::CommandFailed {
                    device: device.to_string(),
                    detail: stderr,
                }
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
