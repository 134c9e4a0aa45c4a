use std::sync::Arc;

use ipr_execution::{CancelHandle, MutationExecutor};
use ipr_gate::{ApprovalState, ApprovalStore, InMemoryApprovalStore};
use ipr_schemas::AllocationStatus;
use ipr_testkit::FakeRegistry;

/// Cancellation mid-batch: the first address has already been applied and
/// its result must survive; addresses not yet dispatched fail with a
/// cancellation error and the request lands in FAILED.
#[tokio::test]
async fn scenario_cancelled_execution_keeps_completed_items() {
    let registry = Arc::new(FakeRegistry::new());
    registry.seed_active(4, "10.0.1.15/24");
    registry.seed_active(5, "10.0.1.22/24");
    registry.seed_active(6, "10.0.1.30/24");

    let store: Arc<dyn ApprovalStore> = Arc::new(InMemoryApprovalStore::new());
    let request = store
        .submit_or_existing(vec![
            "10.0.1.15/24".to_string(),
            "10.0.1.22/24".to_string(),
            "10.0.1.30/24".to_string(),
        ])
        .expect("submit");
    store.decide(request.token, true).expect("approve");

    let cancel = CancelHandle::new();
    registry.cancel_after_first_write(cancel.clone());

    // max_in_flight 1 makes dispatch strictly sequential, so the cancel
    // trips between the first and second address.
    let registry_client: Arc<dyn ipr_registry::RegistryClient> = Arc::clone(&registry) as Arc<dyn ipr_registry::RegistryClient>;
    let executor =
        MutationExecutor::new(registry_client, Arc::clone(&store)).with_max_in_flight(1);
    let outcome = executor
        .execute_with_cancel(request.token, cancel)
        .await
        .expect("execute runs");

    assert_eq!(outcome.request.state, ApprovalState::Failed);
    assert_eq!(outcome.results.len(), 3);

    let first = &outcome.results[0];
    assert!(first.success, "completed item must be reported: {first:?}");
    assert_eq!(first.new_status, Some(AllocationStatus::Deprecated));

    for skipped in &outcome.results[1..] {
        assert!(!skipped.success);
        assert_eq!(skipped.error.as_deref(), Some("cancelled before dispatch"));
    }

    // Registry state matches the per-item results.
    assert_eq!(
        registry.status_of("10.0.1.15/24"),
        Some(AllocationStatus::Deprecated)
    );
    assert_eq!(
        registry.status_of("10.0.1.22/24"),
        Some(AllocationStatus::Active)
    );
}

/// A handle cancelled before execution starts fails every item without a
/// single registry write.
#[tokio::test]
async fn scenario_cancel_before_start_dispatches_nothing() {
    let registry = Arc::new(FakeRegistry::new());
    registry.seed_active(4, "10.0.1.15/24");

    let store: Arc<dyn ApprovalStore> = Arc::new(InMemoryApprovalStore::new());
    let request = store
        .submit_or_existing(vec!["10.0.1.15/24".to_string()])
        .expect("submit");
    store.decide(request.token, true).expect("approve");

    let cancel = CancelHandle::new();
    cancel.cancel();

    let registry_client: Arc<dyn ipr_registry::RegistryClient> = Arc::clone(&registry) as Arc<dyn ipr_registry::RegistryClient>;
    let executor = MutationExecutor::new(registry_client, store);
    let outcome = executor
        .execute_with_cancel(request.token, cancel)
        .await
        .expect("execute runs");

    assert_eq!(outcome.request.state, ApprovalState::Failed);
    assert!(outcome.results.iter().all(|r| !r.success));
    assert_eq!(
        registry.status_of("10.0.1.15/24"),
        Some(AllocationStatus::Active)
    );
}
