//! Mutation gate — approve-before-execute for registry writes.
//!
//! Provides the one piece of shared mutable state in the core: the
//! [`ApprovalRequest`] store. Every destructive registry change flows
//! through two idempotent, independently retryable steps:
//!
//! 1. **Propose** ([`MutationGate::submit`]) — creates a PENDING request, or
//!    returns the existing PENDING request for the same address set. A
//!    retried propose call can never spawn parallel approval prompts.
//! 2. **Decide** ([`MutationGate::decide`]) — PENDING moves to APPROVED or
//!    REJECTED exactly once; deciding an already-decided request is a no-op
//!    that returns the current request unchanged.
//!
//! The gate never talks to the registry. Execution is delegated to the
//! executor crate, which claims APPROVED requests through the same store so
//! a request can never run twice.

mod gate;
mod store;
mod types;

pub use gate::MutationGate;
pub use store::{ApprovalStore, InMemoryApprovalStore, JsonFileApprovalStore};
pub use types::{address_set_hash, canonical_addresses, ApprovalRequest, ApprovalState, GateError};
