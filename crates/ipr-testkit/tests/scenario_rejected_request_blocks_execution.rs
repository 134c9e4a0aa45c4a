use std::sync::Arc;

use ipr_gate::{ApprovalState, GateError};
use ipr_testkit::{service_over, FakeRegistry, StaticCollector};

/// Propose, reject, execute: the executor must refuse because the request
/// is REJECTED, not APPROVED, and the registry must stay untouched.
#[tokio::test]
async fn scenario_rejected_request_blocks_execution() {
    let registry = Arc::new(FakeRegistry::new());
    registry.seed_active(4, "10.0.1.15/24");

    let service = service_over(Arc::clone(&registry), Arc::new(StaticCollector::new()));

    let proposal = service
        .propose_reclamation(&["10.0.1.15/24".to_string()])
        .expect("propose");
    let rejected = service
        .decide_reclamation(proposal.token, false)
        .expect("decide");
    assert_eq!(rejected.state, ApprovalState::Rejected);

    let err = service
        .execute_reclamation(proposal.token)
        .await
        .expect_err("execute must be refused");
    match err.downcast_ref::<GateError>() {
        Some(GateError::NotApproved { state, .. }) => {
            assert_eq!(*state, ApprovalState::Rejected);
        }
        other => panic!("expected NotApproved, got {other:?}"),
    }

    assert_eq!(
        registry.status_of("10.0.1.15/24"),
        Some(ipr_schemas::AllocationStatus::Active)
    );
}

/// Executing a PENDING request is the same contract violation.
#[tokio::test]
async fn scenario_pending_request_blocks_execution() {
    let registry = Arc::new(FakeRegistry::new());
    registry.seed_active(4, "10.0.1.15/24");

    let service = service_over(registry, Arc::new(StaticCollector::new()));
    let proposal = service
        .propose_reclamation(&["10.0.1.15/24".to_string()])
        .expect("propose");

    let err = service
        .execute_reclamation(proposal.token)
        .await
        .expect_err("execute must be refused");
    match err.downcast_ref::<GateError>() {
        Some(GateError::NotApproved { state, .. }) => {
            assert_eq!(*state, ApprovalState::Pending);
        }
        other => panic!("expected NotApproved, got {other:?}"),
    }
}
