//! Deterministic fakes for scenario tests: an in-memory registry and a
//! canned evidence collector. No randomness, no network.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ipr_execution::CancelHandle;
use ipr_gate::InMemoryApprovalStore;
use ipr_probe::{EvidenceCollector, ProbeError};
use ipr_registry::{RegistryClient, RegistryError};
use ipr_runtime::ReclaimService;
use ipr_schemas::{Allocation, AllocationStatus, Evidence, EvidenceSource, ObservedState};

// ---------------------------------------------------------------------------
// Fake registry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeInner {
    allocations: BTreeMap<i64, Allocation>,
    fail_write_addresses: BTreeSet<String>,
    fail_reads: bool,
    writes_seen: usize,
    cancel_after_first_write: Option<CancelHandle>,
}

/// In-memory registry. Deterministic: results come back in id order.
#[derive(Default)]
pub struct FakeRegistry {
    inner: Mutex<FakeInner>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_active(&self, id: i64, address: &str) {
        let mut inner = self.inner.lock().expect("fake registry lock");
        inner
            .allocations
            .insert(id, Allocation::new(id, address, AllocationStatus::Active));
    }

    /// Make `set_status` fail for this address with a simulated API error.
    pub fn fail_writes_to(&self, address: &str) {
        let mut inner = self.inner.lock().expect("fake registry lock");
        inner.fail_write_addresses.insert(address.to_string());
    }

    /// Make every read fail with a transport error.
    pub fn fail_all_reads(&self) {
        let mut inner = self.inner.lock().expect("fake registry lock");
        inner.fail_reads = true;
    }

    /// Trip the given cancel handle as soon as the first write lands.
    pub fn cancel_after_first_write(&self, handle: CancelHandle) {
        let mut inner = self.inner.lock().expect("fake registry lock");
        inner.cancel_after_first_write = Some(handle);
    }

    pub fn status_of(&self, address: &str) -> Option<AllocationStatus> {
        let inner = self.inner.lock().expect("fake registry lock");
        inner
            .allocations
            .values()
            .find(|a| a.address == address)
            .map(|a| a.status)
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn version(&self) -> Result<String, RegistryError> {
        Ok("fake-4.2.3".to_string())
    }

    async fn query_active(&self, prefix: &str) -> Result<Vec<Allocation>, RegistryError> {
        let inner = self.inner.lock().expect("fake registry lock");
        if inner.fail_reads {
            return Err(RegistryError::Transport {
                detail: "fake registry offline".to_string(),
            });
        }
        Ok(inner
            .allocations
            .values()
            .filter(|a| a.status == AllocationStatus::Active)
            .filter(|a| prefix_contains(prefix, &a.address))
            .cloned()
            .collect())
    }

    async fn lookup(&self, address: &str) -> Result<Allocation, RegistryError> {
        let inner = self.inner.lock().expect("fake registry lock");
        if inner.fail_reads {
            return Err(RegistryError::Transport {
                detail: "fake registry offline".to_string(),
            });
        }
        inner
            .allocations
            .values()
            .find(|a| a.address == address)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                address: address.to_string(),
            })
    }

    async fn set_status(
        &self,
        id: i64,
        status: AllocationStatus,
    ) -> Result<Allocation, RegistryError> {
        let mut inner = self.inner.lock().expect("fake registry lock");

        let address = match inner.allocations.get(&id) {
            Some(allocation) => allocation.address.clone(),
            None => {
                return Err(RegistryError::Api {
                    status: 404,
                    detail: format!("no allocation with id {id}"),
                })
            }
        };
        if inner.fail_write_addresses.contains(&address) {
            return Err(RegistryError::Api {
                status: 500,
                detail: "simulated write failure".to_string(),
            });
        }

        let allocation = inner
            .allocations
            .get_mut(&id)
            .expect("allocation checked above");
        allocation.status = status;
        let updated = allocation.clone();

        inner.writes_seen += 1;
        if inner.writes_seen == 1 {
            if let Some(handle) = &inner.cancel_after_first_write {
                handle.cancel();
            }
        }

        Ok(updated)
    }
}

/// IPv4 containment check, enough for test prefixes like "10.0.1.0/24".
pub fn prefix_contains(prefix: &str, address: &str) -> bool {
    let Some((net, len)) = prefix.split_once('/') else {
        return false;
    };
    let (Ok(net), Ok(len)) = (net.parse::<Ipv4Addr>(), len.parse::<u32>()) else {
        return false;
    };
    let bare = address.split('/').next().unwrap_or(address);
    let Ok(ip) = bare.parse::<Ipv4Addr>() else {
        return false;
    };
    if len > 32 {
        return false;
    }
    let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    (u32::from(net) & mask) == (u32::from(ip) & mask)
}

// ---------------------------------------------------------------------------
// Canned collector
// ---------------------------------------------------------------------------

/// Collector returning pre-seeded evidence per device. Devices marked
/// unreachable refuse both polls.
#[derive(Default)]
pub struct StaticCollector {
    arp: BTreeMap<String, Vec<Evidence>>,
    interfaces: BTreeMap<String, Vec<Evidence>>,
    unreachable: BTreeSet<String>,
}

impl StaticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_arp(mut self, device: &str, ip: &str) -> Self {
        self.arp.entry(device.to_string()).or_default().push(
            Evidence::new(ip, EvidenceSource::Arp, device, ObservedState::Up),
        );
        self
    }

    pub fn add_interface(mut self, device: &str, ip: &str, state: ObservedState) -> Self {
        self.interfaces
            .entry(device.to_string())
            .or_default()
            .push(Evidence::new(ip, EvidenceSource::Interface, device, state));
        self
    }

    pub fn mark_unreachable(mut self, device: &str) -> Self {
        self.unreachable.insert(device.to_string());
        self
    }

    fn refuse(&self, device: &str) -> Option<ProbeError> {
        self.unreachable
            .contains(device)
            .then(|| ProbeError::Unreachable {
                device: device.to_string(),
                detail: "connection refused".to_string(),
            })
    }
}

#[async_trait]
impl EvidenceCollector for StaticCollector {
    async fn poll_arp(&self, device: &str) -> Result<Vec<Evidence>, ProbeError> {
        if let Some(err) = self.refuse(device) {
            return Err(err);
        }
        Ok(self.arp.get(device).cloned().unwrap_or_default())
    }

    async fn poll_interfaces(&self, device: &str) -> Result<Vec<Evidence>, ProbeError> {
        if let Some(err) = self.refuse(device) {
            return Err(err);
        }
        Ok(self.interfaces.get(device).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Wiring helper
// ---------------------------------------------------------------------------

/// A full service over the fakes with a fresh in-memory approval store.
pub fn service_over(registry: Arc<FakeRegistry>, collector: Arc<StaticCollector>) -> ReclaimService {
    ReclaimService::new(registry, collector, Arc::new(InMemoryApprovalStore::new()))
}
