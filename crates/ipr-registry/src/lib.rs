//! Allocation-registry client.
//!
//! [`RegistryClient`] is the seam the rest of the system depends on; the
//! [`HttpRegistry`] implementation speaks the NetBox-compatible IPAM REST
//! API (token auth, paginated reads, PATCH status writes). Test fixtures
//! implement the same trait in-memory.

mod error;
mod http;

use async_trait::async_trait;
use ipr_schemas::{Allocation, AllocationStatus};

pub use error::RegistryError;
pub use http::HttpRegistry;

/// Read/write access to the allocation registry.
///
/// Reads feed the reconcile pass; `set_status` is the single write the
/// system ever performs, and only the mutation executor calls it.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Registry server version, used as a connectivity / auth smoke test.
    async fn version(&self) -> Result<String, RegistryError>;

    /// Every allocation with status `active` inside the given prefix.
    async fn query_active(&self, prefix: &str) -> Result<Vec<Allocation>, RegistryError>;

    /// Look a single address up. `RegistryError::NotFound` when the registry
    /// has no record of it.
    async fn lookup(&self, address: &str) -> Result<Allocation, RegistryError>;

    /// Change one allocation's status, returning the updated record.
    async fn set_status(
        &self,
        id: i64,
        status: AllocationStatus,
    ) -> Result<Allocation, RegistryError>;
}
