use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use ipr_gate::{ApprovalStore, GateError};
use ipr_registry::{RegistryClient, RegistryError};
use ipr_schemas::AllocationStatus;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{BatchOutcome, CancelHandle, MutationResult};

const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Applies approved reclamation batches through the registry client.
pub struct MutationExecutor {
    registry: Arc<dyn RegistryClient>,
    store: Arc<dyn ApprovalStore>,
    max_in_flight: usize,
}

impl MutationExecutor {
    pub fn new(registry: Arc<dyn RegistryClient>, store: Arc<dyn ApprovalStore>) -> Self {
        Self {
            registry,
            store,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Execute an approved request to completion.
    pub async fn execute(&self, token: Uuid) -> Result<BatchOutcome, GateError> {
        self.execute_with_cancel(token, CancelHandle::new()).await
    }

    /// Execute with a caller-held cancellation handle.
    ///
    /// The store claim happens first: a request that is not APPROVED, or is
    /// already being executed, is rejected before any registry call.
    pub async fn execute_with_cancel(
        &self,
        token: Uuid,
        cancel: CancelHandle,
    ) -> Result<BatchOutcome, GateError> {
        let request = self.store.begin_execute(token)?;
        info!(%token, addresses = request.addresses.len(), "executing reclamation batch");

        // Order-preserving bounded fan-out; the collect is the join barrier
        // that gates the terminal-state write below.
        let results: Vec<MutationResult> = stream::iter(request.addresses.clone())
            .map(|address| {
                let cancel = cancel.clone();
                async move { self.deprecate_one(&address, &cancel).await }
            })
            .buffered(self.max_in_flight)
            .collect()
            .await;

        let all_succeeded = results.iter().all(|r| r.success);
        let request = self.store.finish_execute(token, all_succeeded)?;

        info!(
            %token,
            state = %request.state,
            succeeded = results.iter().filter(|r| r.success).count(),
            failed = results.iter().filter(|r| !r.success).count(),
            "reclamation batch finished"
        );

        Ok(BatchOutcome { request, results })
    }

    async fn deprecate_one(&self, address: &str, cancel: &CancelHandle) -> MutationResult {
        if cancel.is_cancelled() {
            return MutationResult::failed(address, None, None, "cancelled before dispatch");
        }

        let allocation = match self.registry.lookup(address).await {
            Ok(allocation) => allocation,
            Err(RegistryError::NotFound { .. }) => {
                warn!(address, "reclamation target not found in registry");
                return MutationResult::failed(address, None, None, "not found in registry");
            }
            Err(err) => {
                warn!(address, %err, "registry lookup failed");
                return MutationResult::failed(address, None, None, err.to_string());
            }
        };

        let previous = allocation.status;
        match self
            .registry
            .set_status(allocation.id, AllocationStatus::Deprecated)
            .await
        {
            Ok(updated) => {
                info!(address, registry_id = allocation.id, %previous, "address deprecated");
                MutationResult::applied(address, allocation.id, previous, updated.status)
            }
            Err(err) => {
                warn!(address, registry_id = allocation.id, %err, "status update failed");
                MutationResult::failed(address, Some(allocation.id), Some(previous), err.to_string())
            }
        }
    }
}
