use std::net::IpAddr;

use ipr_schemas::{Allocation, Evidence};

use crate::types::{Confidence, EvidenceIndex, InvalidAddressError, StaleEntry};

/// Strip an optional `/len` suffix and validate what remains parses as an IP
/// address.
///
/// "10.0.1.15/24" and "10.0.1.15" both normalize to "10.0.1.15". Anything
/// else is an [`InvalidAddressError`].
pub fn bare_ip(address: &str) -> Result<String, InvalidAddressError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(InvalidAddressError::new(address, "empty address string"));
    }

    let (bare, prefix_len) = match trimmed.split_once('/') {
        Some((ip, len)) => (ip, Some(len)),
        None => (trimmed, None),
    };

    let ip: IpAddr = bare
        .parse()
        .map_err(|_| InvalidAddressError::new(address, "not an IP address"))?;

    if let Some(len) = prefix_len {
        let max = if ip.is_ipv4() { 32u32 } else { 128u32 };
        let parsed: u32 = len
            .parse()
            .map_err(|_| InvalidAddressError::new(address, "prefix length is not an integer"))?;
        if parsed > max {
            return Err(InvalidAddressError::new(address, "prefix length out of range"));
        }
    }

    Ok(ip.to_string())
}

/// Classify every allocation with no corroborating live evidence as stale.
///
/// Rules, in order:
/// - not present in any evidence source => `Confidence::High`
/// - present, but every observation is down/unknown => `Confidence::Medium`
/// - present with at least one up/static observation => not stale, omitted
///
/// Output order follows the input allocation order. The function is pure;
/// callers supply the already-gathered evidence list.
pub fn classify(
    allocations: &[Allocation],
    evidence: &[Evidence],
) -> Result<Vec<StaleEntry>, InvalidAddressError> {
    let index = EvidenceIndex::build(evidence)?;

    let mut stale = Vec::new();
    for alloc in allocations {
        let bare = bare_ip(&alloc.address)?;

        match index.observations(&bare) {
            None => stale.push(StaleEntry {
                address: alloc.address.clone(),
                registry_id: alloc.id,
                last_seen: "unknown".to_string(),
                device: "none".to_string(),
                confidence: Confidence::High,
                reason: "not found in any evidence source".to_string(),
            }),
            Some(observations) => {
                // Tie-break: any live observation wins outright.
                if observations.iter().any(Evidence::is_live) {
                    continue;
                }
                stale.push(medium_entry(alloc, observations));
            }
        }
    }

    Ok(stale)
}

fn medium_entry(alloc: &Allocation, observations: &[Evidence]) -> StaleEntry {
    // Deterministic pick: observations preserve evidence input order.
    let device = observations
        .first()
        .map(|ev| ev.device.clone())
        .unwrap_or_else(|| "none".to_string());

    StaleEntry {
        address: alloc.address.clone(),
        registry_id: alloc.id,
        last_seen: "unknown".to_string(),
        device: device.clone(),
        confidence: Confidence::Medium,
        reason: format!("seen only with non-live state on {device}"),
    }
}
