use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use ipr_schemas::Evidence;
use tracing::warn;

use crate::collector::EvidenceCollector;

/// Fan-out knobs for multi-device evidence gathering.
#[derive(Clone, Debug)]
pub struct GatherOptions {
    /// Budget for both polls against one device.
    pub per_device_timeout: Duration,
    pub max_in_flight: usize,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            per_device_timeout: Duration::from_secs(20),
            max_in_flight: 4,
        }
    }
}

/// Poll every device for ARP and interface evidence with bounded
/// parallelism.
///
/// Degradation contract: a device that times out or errors contributes no
/// evidence and a warning, never a failure. The reconcile pass must survive
/// a flaky probe; an unreachable device simply cannot vouch for any
/// address.
pub async fn gather_evidence(
    collector: Arc<dyn EvidenceCollector>,
    devices: &[String],
    opts: &GatherOptions,
) -> Vec<Evidence> {
    let per_device = stream::iter(devices.to_vec())
        .map(|device| {
            let collector = Arc::clone(&collector);
            let timeout = opts.per_device_timeout;
            async move { poll_device(collector.as_ref(), &device, timeout).await }
        })
        .buffer_unordered(opts.max_in_flight.max(1))
        .collect::<Vec<Vec<Evidence>>>()
        .await;

    per_device.into_iter().flatten().collect()
}

async fn poll_device(
    collector: &dyn EvidenceCollector,
    device: &str,
    timeout: Duration,
) -> Vec<Evidence> {
    let polls = async {
        let mut evidence = Vec::new();
        match collector.poll_arp(device).await {
            Ok(mut arp) => evidence.append(&mut arp),
            Err(err) => warn!(device, %err, "ARP poll failed; no ARP evidence from device"),
        }
        match collector.poll_interfaces(device).await {
            Ok(mut ifaces) => evidence.append(&mut ifaces),
            Err(err) => {
                warn!(device, %err, "interface poll failed; no interface evidence from device");
            }
        }
        evidence
    };

    match tokio::time::timeout(timeout, polls).await {
        Ok(evidence) => evidence,
        Err(_) => {
            warn!(
                device,
                timeout_secs = timeout.as_secs(),
                "device timed out; contributes no evidence"
            );
            Vec::new()
        }
    }
}
