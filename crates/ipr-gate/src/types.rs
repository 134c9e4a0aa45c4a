use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Lifecycle of an approval request.
///
/// `PENDING -> {APPROVED, REJECTED} -> {EXECUTED, FAILED}`. REJECTED,
/// EXECUTED and FAILED are terminal; APPROVED is transient and consumed by
/// the executor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
    Executed,
    Failed,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "PENDING",
            ApprovalState::Approved => "APPROVED",
            ApprovalState::Rejected => "REJECTED",
            ApprovalState::Executed => "EXECUTED",
            ApprovalState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApprovalState::Rejected | ApprovalState::Executed | ApprovalState::Failed
        )
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed bulk status change, tracked across external calls.
///
/// This is the only core entity with a lifecycle spanning multiple calls.
/// `token` identifies it, so repeated submissions of the same logical
/// request stay idempotent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub token: Uuid,
    /// Canonical form: sorted, deduplicated.
    pub addresses: Vec<String>,
    pub state: ApprovalState,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Sort and deduplicate an address set. Two proposals are "the same" iff
/// their canonical forms match, regardless of input order or repeats.
pub fn canonical_addresses(addresses: &[String]) -> Vec<String> {
    let mut out: Vec<String> = addresses.iter().map(|a| a.trim().to_string()).collect();
    out.sort();
    out.dedup();
    out
}

/// Stable hash of a canonical address set, used as the dedup key for
/// PENDING requests.
pub fn address_set_hash(canonical: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}

/// Gate and store failures.
///
/// State-machine violations are first-class variants so callers can tell a
/// contract bug (executing an un-approved request) from a broken store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateError {
    UnknownToken { token: Uuid },
    EmptyAddressSet,
    /// Execution was attempted on a request that is not APPROVED.
    NotApproved { token: Uuid, state: ApprovalState },
    /// Execution was attempted while another execute holds the claim.
    AlreadyRunning { token: Uuid },
    Store { detail: String },
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::UnknownToken { token } => {
                write!(f, "no approval request with token {token}")
            }
            GateError::EmptyAddressSet => {
                write!(f, "refusing to create an approval request for zero addresses")
            }
            GateError::NotApproved { token, state } => write!(
                f,
                "request {token} is {state}, not APPROVED; re-submit through the gate"
            ),
            GateError::AlreadyRunning { token } => {
                write!(f, "request {token} is already being executed")
            }
            GateError::Store { detail } => write!(f, "approval store failure: {detail}"),
        }
    }
}

impl std::error::Error for GateError {}
