use ipr_reconcile::{classify, Confidence};
use ipr_schemas::{Allocation, AllocationStatus, Evidence, EvidenceSource, ObservedState};

fn active(id: i64, address: &str) -> Allocation {
    Allocation::new(id, address, AllocationStatus::Active)
}

#[test]
fn scenario_empty_evidence_marks_every_allocation_high() {
    let allocations = vec![
        active(1, "10.0.1.1/24"),
        active(2, "10.0.1.2/24"),
        active(3, "10.0.1.3/24"),
    ];

    let stale = classify(&allocations, &[]).expect("classify");

    assert_eq!(stale.len(), allocations.len());
    for (entry, alloc) in stale.iter().zip(&allocations) {
        assert_eq!(entry.address, alloc.address);
        assert_eq!(entry.registry_id, alloc.id);
        assert_eq!(entry.confidence, Confidence::High);
    }
}

#[test]
fn scenario_down_interface_only_is_medium_confidence() {
    let allocations = vec![active(7, "10.0.1.40/24")];
    let evidence = vec![Evidence::new(
        "10.0.1.40",
        EvidenceSource::Interface,
        "leaf2",
        ObservedState::Down,
    )];

    let stale = classify(&allocations, &evidence).expect("classify");

    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].confidence, Confidence::Medium);
    assert_eq!(stale[0].device, "leaf2");
    assert!(stale[0].reason.contains("leaf2"));
}

/// Conflicting evidence: one down interface entry plus one live ARP entry.
/// Live evidence must dominate, so the address is not stale at all.
#[test]
fn scenario_live_evidence_dominates_down_evidence() {
    let allocations = vec![active(8, "10.0.1.41/24")];
    let evidence = vec![
        Evidence::new(
            "10.0.1.41",
            EvidenceSource::Interface,
            "leaf2",
            ObservedState::Down,
        ),
        Evidence::new("10.0.1.41", EvidenceSource::Arp, "spine1", ObservedState::Up),
    ];

    let stale = classify(&allocations, &evidence).expect("classify");
    assert!(stale.is_empty(), "live evidence must win: {stale:?}");
}

/// Static ARP entries count as live: the address is pinned on a device.
#[test]
fn scenario_static_arp_entry_counts_as_live() {
    let allocations = vec![active(9, "10.0.1.42/24")];
    let evidence = vec![Evidence::new(
        "10.0.1.42",
        EvidenceSource::Arp,
        "spine1",
        ObservedState::Static,
    )];

    let stale = classify(&allocations, &evidence).expect("classify");
    assert!(stale.is_empty());
}

#[test]
fn scenario_unknown_state_only_is_medium_confidence() {
    let allocations = vec![active(10, "10.0.1.43/24")];
    let evidence = vec![Evidence::new(
        "10.0.1.43",
        EvidenceSource::Interface,
        "leaf1",
        ObservedState::Unknown,
    )];

    let stale = classify(&allocations, &evidence).expect("classify");
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].confidence, Confidence::Medium);
}

#[test]
fn scenario_malformed_address_fails_loudly() {
    let allocations = vec![active(11, "not-an-ip/24")];
    let err = classify(&allocations, &[]).expect_err("malformed address must fail");
    assert_eq!(err.address, "not-an-ip/24");

    let allocations = vec![active(12, "10.0.1.44/notalen")];
    assert!(classify(&allocations, &[]).is_err());

    let evidence = vec![Evidence::new(
        "bogus",
        EvidenceSource::Arp,
        "spine1",
        ObservedState::Up,
    )];
    let allocations = vec![active(13, "10.0.1.45/24")];
    assert!(classify(&allocations, &evidence).is_err());
}
