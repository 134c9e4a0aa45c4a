use serde::{Deserialize, Serialize};

/// Lifecycle status of a registry allocation.
///
/// Wire values match the IPAM registry's lowercase status vocabulary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Active,
    Deprecated,
    Reserved,
    Dhcp,
    Slaac,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Deprecated => "deprecated",
            AllocationStatus::Reserved => "reserved",
            AllocationStatus::Dhcp => "dhcp",
            AllocationStatus::Slaac => "slaac",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "active" => Some(AllocationStatus::Active),
            "deprecated" => Some(AllocationStatus::Deprecated),
            "reserved" => Some(AllocationStatus::Reserved),
            "dhcp" => Some(AllocationStatus::Dhcp),
            "slaac" => Some(AllocationStatus::Slaac),
            _ => None,
        }
    }
}

impl std::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One address record as held by the allocation registry.
///
/// The registry owns these; the reconcile engine only reads them and the
/// mutation executor only ever writes `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Registry object id.
    pub id: i64,
    /// CIDR form, e.g. "10.0.1.5/24".
    pub address: String,
    pub status: AllocationStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dns_name: String,
}

impl Allocation {
    pub fn new(id: i64, address: impl Into<String>, status: AllocationStatus) -> Self {
        Self {
            id,
            address: address.into(),
            status,
            description: String::new(),
            dns_name: String::new(),
        }
    }
}

/// Which probe surface produced an observation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Arp,
    Interface,
}

/// Liveness state attached to an observation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedState {
    Up,
    Down,
    Static,
    Unknown,
}

/// A single probe observation of an address on a device.
///
/// Evidence is ephemeral: it is regenerated on every reconciliation pass and
/// never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Bare address, no prefix length.
    pub ip: String,
    pub source: EvidenceSource,
    pub device: String,
    pub observed_state: ObservedState,
}

impl Evidence {
    pub fn new(
        ip: impl Into<String>,
        source: EvidenceSource,
        device: impl Into<String>,
        observed_state: ObservedState,
    ) -> Self {
        Self {
            ip: ip.into(),
            source,
            device: device.into(),
            observed_state,
        }
    }

    /// Live evidence dominates any down/absent evidence for the same address.
    pub fn is_live(&self) -> bool {
        matches!(
            self.observed_state,
            ObservedState::Up | ObservedState::Static
        )
    }
}
