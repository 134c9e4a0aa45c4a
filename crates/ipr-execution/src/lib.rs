//! Mutation executor — applies an approved reclamation batch.
//!
//! # Invariants
//!
//! - Only an APPROVED request can run; the claim through the approval store
//!   is atomic, so a request can never run twice, sequentially or
//!   concurrently. Re-running a finished request is rejected (registry
//!   state may have changed); callers re-submit through the gate.
//! - One address's failure never aborts the rest of the batch. Every
//!   address yields a [`MutationResult`], success or not.
//! - The request's terminal state is written only after every per-address
//!   future has joined: EXECUTED iff all succeeded, FAILED otherwise.
//! - Cancellation is best-effort: addresses not yet dispatched fail with a
//!   cancellation error, completed results are kept, and the request is
//!   marked FAILED.

mod executor;
mod types;

pub use executor::MutationExecutor;
pub use types::{BatchOutcome, CancelHandle, MutationResult};
