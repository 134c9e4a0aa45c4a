use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ipr_gate::ApprovalRequest;
use ipr_schemas::AllocationStatus;
use serde::{Deserialize, Serialize};

/// Outcome of one address in an executed batch. Never dropped: the
/// aggregate always carries one result per requested address, in request
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub address: String,
    pub registry_id: Option<i64>,
    pub previous_status: Option<AllocationStatus>,
    pub new_status: Option<AllocationStatus>,
    pub success: bool,
    pub error: Option<String>,
}

impl MutationResult {
    pub fn applied(
        address: &str,
        registry_id: i64,
        previous_status: AllocationStatus,
        new_status: AllocationStatus,
    ) -> Self {
        Self {
            address: address.to_string(),
            registry_id: Some(registry_id),
            previous_status: Some(previous_status),
            new_status: Some(new_status),
            success: true,
            error: None,
        }
    }

    pub fn failed(
        address: &str,
        registry_id: Option<i64>,
        previous_status: Option<AllocationStatus>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            address: address.to_string(),
            registry_id,
            previous_status,
            new_status: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// An executed batch: the request in its terminal state plus every item
/// result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub request: ApprovalRequest,
    pub results: Vec<MutationResult>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

/// Best-effort cancellation for an in-flight batch. Cloneable; cancelling
/// any clone stops dispatch of not-yet-started addresses.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
