use std::collections::BTreeMap;

use ipr_schemas::Evidence;
use serde::{Deserialize, Serialize};

/// Qualitative certainty that a classified address is actually stale.
///
/// `High` means no evidence source mentioned the address at all; `Medium`
/// means it was seen, but never in a live state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
        }
    }
}

/// One allocation judged stale, with the evidence trail that justifies it.
///
/// `registry_id` serializes as `netbox_id`: the report JSON is a published
/// contract consumed by downstream tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleEntry {
    /// CIDR form, exactly as held by the registry.
    pub address: String,
    #[serde(rename = "netbox_id")]
    pub registry_id: i64,
    /// "unknown" when no evidence carries a timestamp (probes do not report
    /// one today).
    pub last_seen: String,
    /// Device that last mentioned the address, "none" when nothing did.
    pub device: String,
    pub confidence: Confidence,
    pub reason: String,
}

/// Error raised when an address string cannot be normalized.
///
/// A malformed address is a data-integrity problem in the registry or a
/// probe parser; dropping it silently would corrupt the stale count, so the
/// whole classification pass fails instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidAddressError {
    /// The offending address string, verbatim.
    pub address: String,
    pub detail: String,
}

impl InvalidAddressError {
    pub(crate) fn new(address: &str, detail: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for InvalidAddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid address {:?}: {}", self.address, self.detail)
    }
}

impl std::error::Error for InvalidAddressError {}

/// Derived mapping from bare IP to every observation of it.
///
/// Built fresh per classification run. An address is "seen" iff it has at
/// least one entry here, regardless of source.
#[derive(Clone, Debug, Default)]
pub struct EvidenceIndex {
    by_ip: BTreeMap<String, Vec<Evidence>>,
}

impl EvidenceIndex {
    /// Build the index, normalizing every observation's address to its bare
    /// form.
    pub fn build(evidence: &[Evidence]) -> Result<Self, InvalidAddressError> {
        let mut by_ip: BTreeMap<String, Vec<Evidence>> = BTreeMap::new();
        for ev in evidence {
            let bare = crate::engine::bare_ip(&ev.ip)?;
            by_ip.entry(bare).or_default().push(ev.clone());
        }
        Ok(Self { by_ip })
    }

    pub fn observations(&self, bare: &str) -> Option<&[Evidence]> {
        self.by_ip.get(bare).map(Vec::as_slice)
    }

    pub fn is_seen(&self, bare: &str) -> bool {
        self.by_ip.contains_key(bare)
    }

    pub fn len(&self) -> usize {
        self.by_ip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ip.is_empty()
    }
}
