use std::sync::Arc;

use uuid::Uuid;

use crate::store::ApprovalStore;
use crate::types::{canonical_addresses, ApprovalRequest, GateError};

/// The approval front door. Holds no state of its own; every transition
/// goes through the injected [`ApprovalStore`].
#[derive(Clone)]
pub struct MutationGate {
    store: Arc<dyn ApprovalStore>,
}

impl MutationGate {
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn ApprovalStore> {
        Arc::clone(&self.store)
    }

    /// Propose a reclamation. Idempotent per canonical address set while the
    /// matching request is still PENDING.
    pub fn submit(&self, addresses: &[String]) -> Result<ApprovalRequest, GateError> {
        let canonical = canonical_addresses(addresses);
        if canonical.is_empty() {
            return Err(GateError::EmptyAddressSet);
        }
        self.store.submit_or_existing(canonical)
    }

    /// Record the human decision. Deciding a non-PENDING request changes
    /// nothing and returns it as-is.
    pub fn decide(&self, token: Uuid, approved: bool) -> Result<ApprovalRequest, GateError> {
        self.store.decide(token, approved)
    }

    /// Abandon a PENDING or APPROVED request.
    pub fn cancel(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        self.store.cancel(token)
    }

    pub fn get(&self, token: Uuid) -> Result<ApprovalRequest, GateError> {
        self.store
            .get(token)?
            .ok_or(GateError::UnknownToken { token })
    }
}
