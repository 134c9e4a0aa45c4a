use std::sync::Arc;

use ipr_gate::{ApprovalState, GateError, InMemoryApprovalStore, MutationGate};

fn gate() -> MutationGate {
    MutationGate::new(Arc::new(InMemoryApprovalStore::new()))
}

#[test]
fn scenario_deciding_twice_does_not_flip_the_outcome() {
    let gate = gate();
    let req = gate.submit(&["10.0.1.15/24".to_string()]).expect("submit");

    let approved = gate.decide(req.token, true).expect("decide");
    assert_eq!(approved.state, ApprovalState::Approved);
    let decided_at = approved.decided_at.expect("decided_at set");

    // Second decision, opposite verdict: no-op.
    let again = gate.decide(req.token, false).expect("decide again");
    assert_eq!(again.state, ApprovalState::Approved);
    assert_eq!(again.decided_at, Some(decided_at));
}

#[test]
fn scenario_rejection_is_terminal() {
    let gate = gate();
    let req = gate.submit(&["10.0.1.15/24".to_string()]).expect("submit");

    let rejected = gate.decide(req.token, false).expect("decide");
    assert_eq!(rejected.state, ApprovalState::Rejected);

    let again = gate.decide(req.token, true).expect("decide again");
    assert_eq!(again.state, ApprovalState::Rejected);
}

#[test]
fn scenario_cancel_abandons_pending_and_approved_only() {
    let gate = gate();

    let pending = gate.submit(&["10.0.1.15/24".to_string()]).expect("submit");
    let cancelled = gate.cancel(pending.token).expect("cancel");
    assert_eq!(cancelled.state, ApprovalState::Rejected);

    let approved = gate.submit(&["10.0.1.22/24".to_string()]).expect("submit");
    gate.decide(approved.token, true).expect("decide");
    let cancelled = gate.cancel(approved.token).expect("cancel");
    assert_eq!(cancelled.state, ApprovalState::Rejected);

    // Terminal: a second cancel is a no-op.
    let again = gate.cancel(approved.token).expect("cancel again");
    assert_eq!(again.state, ApprovalState::Rejected);
}

#[test]
fn scenario_unknown_token_is_an_error() {
    let gate = gate();
    let token = uuid::Uuid::new_v4();
    assert_eq!(
        gate.decide(token, true),
        Err(GateError::UnknownToken { token })
    );
}
