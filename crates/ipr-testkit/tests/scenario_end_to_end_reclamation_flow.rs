use std::sync::Arc;

use ipr_gate::{ApprovalState, GateError};
use ipr_reconcile::Confidence;
use ipr_schemas::AllocationStatus;
use ipr_testkit::{service_over, FakeRegistry, StaticCollector};

/// The full desk workflow against the lab seed data: audit the prefix,
/// propose the stale addresses, approve, execute, and confirm the registry
/// was updated.
#[tokio::test]
async fn scenario_end_to_end_reclamation_flow() {
    let registry = Arc::new(FakeRegistry::new());
    registry.seed_active(1, "10.0.1.1/24");
    registry.seed_active(2, "10.0.1.5/24");
    registry.seed_active(3, "10.0.1.10/24");
    registry.seed_active(4, "10.0.1.15/24");
    registry.seed_active(5, "10.0.1.22/24");
    registry.seed_active(6, "10.0.1.30/24");

    let collector = Arc::new(
        StaticCollector::new()
            .add_arp("spine1", "10.0.1.1")
            .add_arp("spine1", "10.0.1.5")
            .add_arp("spine1", "10.0.1.10")
            .add_interface("spine1", "10.0.1.1", ipr_schemas::ObservedState::Up),
    );

    let service = service_over(Arc::clone(&registry), collector);
    let devices = vec!["spine1".to_string()];

    // 1) Read-only audit.
    let report = service.reconcile("10.0.1.0/24", &devices).await.expect("reconcile");
    assert_eq!(report.summary.total_allocated, 6);
    assert_eq!(report.summary.total_stale, 3);
    assert_eq!(report.summary.reclamation_rate, 50.0);
    assert!(report
        .stale_ips
        .iter()
        .all(|e| e.confidence == Confidence::High));

    // 2) Propose the stale set; re-propose returns the same token.
    let proposal = service
        .propose_reclamation(&report.stale_addresses())
        .expect("propose");
    assert_eq!(proposal.state, ApprovalState::Pending);
    let again = service
        .propose_reclamation(&report.stale_addresses())
        .expect("re-propose");
    assert_eq!(again.token, proposal.token);

    // 3) Approve and execute.
    let approved = service
        .decide_reclamation(proposal.token, true)
        .expect("decide");
    assert_eq!(approved.state, ApprovalState::Approved);

    let outcome = service
        .execute_reclamation(proposal.token)
        .await
        .expect("execute");
    assert_eq!(outcome.request.state, ApprovalState::Executed);
    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.all_succeeded());
    for result in &outcome.results {
        assert_eq!(result.previous_status, Some(AllocationStatus::Active));
        assert_eq!(result.new_status, Some(AllocationStatus::Deprecated));
    }

    // 4) Registry reflects the mutation; live addresses are untouched.
    assert_eq!(
        registry.status_of("10.0.1.15/24"),
        Some(AllocationStatus::Deprecated)
    );
    assert_eq!(
        registry.status_of("10.0.1.1/24"),
        Some(AllocationStatus::Active)
    );

    // 5) A second execute of the same request is rejected.
    let err = service
        .execute_reclamation(proposal.token)
        .await
        .expect_err("double execute");
    match err.downcast_ref::<GateError>() {
        Some(GateError::NotApproved { state, .. }) => {
            assert_eq!(*state, ApprovalState::Executed);
        }
        other => panic!("expected NotApproved, got {other:?}"),
    }

    // 6) A fresh audit no longer sees the reclaimed addresses as active.
    let report = service.reconcile("10.0.1.0/24", &devices).await.expect("reconcile");
    assert_eq!(report.summary.total_allocated, 3);
    assert_eq!(report.summary.total_stale, 0);
    assert!(!report.has_stale());
}
