use std::sync::Arc;

use ipr_gate::{ApprovalState, ApprovalStore, JsonFileApprovalStore, MutationGate};

/// Each CLI command is its own process: the request proposed by `propose`
/// must still exist when `decide` and `execute` run later.
#[test]
fn scenario_file_store_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("approvals.json");

    let token = {
        let gate = MutationGate::new(Arc::new(
            JsonFileApprovalStore::open(&path).expect("open store"),
        ));
        let req = gate
            .submit(&["10.0.1.15/24".to_string(), "10.0.1.22/24".to_string()])
            .expect("submit");
        req.token
    };

    // "Restart": a brand new store over the same file.
    let gate = MutationGate::new(Arc::new(
        JsonFileApprovalStore::open(&path).expect("reopen store"),
    ));

    let loaded = gate.get(token).expect("request survives restart");
    assert_eq!(loaded.state, ApprovalState::Pending);

    // Idempotent submit still finds the persisted PENDING request.
    let resubmitted = gate
        .submit(&["10.0.1.22/24".to_string(), "10.0.1.15/24".to_string()])
        .expect("submit");
    assert_eq!(resubmitted.token, token);

    let approved = gate.decide(token, true).expect("decide");
    assert_eq!(approved.state, ApprovalState::Approved);
}

#[test]
fn scenario_file_store_claims_and_finishes_execution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileApprovalStore::open(dir.path().join("approvals.json")).expect("open");

    let req = store
        .submit_or_existing(vec!["10.0.1.15/24".to_string()])
        .expect("submit");
    store.decide(req.token, true).expect("decide");

    let claimed = store.begin_execute(req.token).expect("claim");
    assert_eq!(claimed.state, ApprovalState::Approved);

    let finished = store.finish_execute(req.token, false).expect("finish");
    assert_eq!(finished.state, ApprovalState::Failed);

    // Terminal state persisted.
    let reloaded = store.get(req.token).expect("get").expect("present");
    assert_eq!(reloaded.state, ApprovalState::Failed);
}
