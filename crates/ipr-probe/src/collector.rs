use std::sync::Arc;

use async_trait::async_trait;
use ipr_schemas::{Evidence, EvidenceSource, ObservedState};

use crate::parse::{parse_arp_output, parse_interface_brief};
use crate::transport::{DeviceTransport, ProbeError};

const SHOW_ARP: &str = "show ip arp";
const SHOW_INTERFACES: &str = "show ip interface brief";

/// Per-device evidence source. One implementation per NOS family; fakes in
/// tests implement it directly.
#[async_trait]
pub trait EvidenceCollector: Send + Sync {
    async fn poll_arp(&self, device: &str) -> Result<Vec<Evidence>, ProbeError>;
    async fn poll_interfaces(&self, device: &str) -> Result<Vec<Evidence>, ProbeError>;
}

/// Arista EOS collector: runs the two show commands over the injected
/// transport and maps the parsed rows to evidence.
pub struct EosCollector {
    transport: Arc<dyn DeviceTransport>,
}

impl EosCollector {
    pub fn new(transport: Arc<dyn DeviceTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl EvidenceCollector for EosCollector {
    async fn poll_arp(&self, device: &str) -> Result<Vec<Evidence>, ProbeError> {
        let raw = self.transport.run_command(device, SHOW_ARP).await?;
        Ok(parse_arp_output(&raw)
            .into_iter()
            .map(|entry| {
                let state = if entry.is_static() {
                    ObservedState::Static
                } else {
                    ObservedState::Up
                };
                Evidence::new(entry.ip_address, EvidenceSource::Arp, device, state)
            })
            .collect())
    }

    async fn poll_interfaces(&self, device: &str) -> Result<Vec<Evidence>, ProbeError> {
        let raw = self.transport.run_command(device, SHOW_INTERFACES).await?;
        Ok(parse_interface_brief(&raw)
            .into_iter()
            .map(|entry| {
                let state = match entry.status.as_str() {
                    "up" => ObservedState::Up,
                    "down" => ObservedState::Down,
                    _ => ObservedState::Unknown,
                };
                // Evidence carries bare addresses; the brief output prints
                // interface addresses in CIDR form.
                let bare = entry
                    .ip_address
                    .split('/')
                    .next()
                    .unwrap_or(&entry.ip_address)
                    .to_string();
                Evidence::new(bare, EvidenceSource::Interface, device, state)
            })
            .collect())
    }
}
