//! Service facade wiring the core together.
//!
//! [`ReclaimService`] owns no policy of its own: reads go through the
//! registry client and probes, classification is the pure engine, and every
//! mutation flows through the gate and executor. All collaborators are
//! injected, so the whole service runs against fakes in tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use ipr_audit::AuditLog;
use ipr_execution::{BatchOutcome, CancelHandle, MutationExecutor};
use ipr_gate::{ApprovalRequest, ApprovalStore, MutationGate};
use ipr_probe::{gather_evidence, EvidenceCollector, GatherOptions};
use ipr_reconcile::{build_report, classify, ReclamationReport};
use ipr_registry::RegistryClient;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

pub struct ReclaimService {
    registry: Arc<dyn RegistryClient>,
    collector: Arc<dyn EvidenceCollector>,
    gate: MutationGate,
    executor: MutationExecutor,
    audit: Option<AuditLog>,
    gather: GatherOptions,
}

impl ReclaimService {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        collector: Arc<dyn EvidenceCollector>,
        store: Arc<dyn ApprovalStore>,
    ) -> Self {
        Self {
            executor: MutationExecutor::new(Arc::clone(&registry), Arc::clone(&store)),
            gate: MutationGate::new(store),
            registry,
            collector,
            audit: None,
            gather: GatherOptions::default(),
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_gather_options(mut self, gather: GatherOptions) -> Self {
        self.gather = gather;
        self
    }

    /// Read-only drift audit for one prefix. Safe to call repeatedly.
    ///
    /// A registry failure aborts the call: without a trustworthy allocation
    /// list no classification can be produced. Probe failures only degrade
    /// (an unreachable device contributes no evidence).
    pub async fn reconcile(&self, prefix: &str, devices: &[String]) -> Result<ReclamationReport> {
        let allocations = self
            .registry
            .query_active(prefix)
            .await
            .with_context(|| format!("querying active allocations for prefix {prefix}"))?;

        let evidence = gather_evidence(Arc::clone(&self.collector), devices, &self.gather).await;

        let entries = classify(&allocations, &evidence)
            .with_context(|| format!("classifying allocations for prefix {prefix}"))?;
        let report = build_report(entries, prefix, Some(allocations.len()));

        info!(
            prefix,
            report_id = %report.report_id,
            total_allocated = report.summary.total_allocated,
            total_stale = report.summary.total_stale,
            "reconcile pass complete"
        );
        self.audit_event(
            "report_generated",
            None,
            json!({
                "report_id": report.report_id.clone(),
                "prefix": prefix,
                "total_stale": report.summary.total_stale,
            }),
        )?;

        Ok(report)
    }

    /// Propose marking a set of addresses deprecated. Idempotent per
    /// address set while the matching request is PENDING.
    pub fn propose_reclamation(&self, addresses: &[String]) -> Result<ApprovalRequest> {
        let request = self.gate.submit(addresses)?;
        self.audit_event(
            "proposal_submitted",
            Some(request.token),
            json!({"addresses": request.addresses.clone(), "state": request.state}),
        )?;
        Ok(request)
    }

    /// Record the operator's verdict.
    pub fn decide_reclamation(&self, token: Uuid, approved: bool) -> Result<ApprovalRequest> {
        let request = self.gate.decide(token, approved)?;
        self.audit_event(
            "proposal_decided",
            Some(token),
            json!({"approved": approved, "state": request.state}),
        )?;
        Ok(request)
    }

    /// Abandon a PENDING or APPROVED request.
    pub fn cancel_reclamation(&self, token: Uuid) -> Result<ApprovalRequest> {
        let request = self.gate.cancel(token)?;
        self.audit_event(
            "proposal_cancelled",
            Some(token),
            json!({"state": request.state}),
        )?;
        Ok(request)
    }

    pub fn approval_status(&self, token: Uuid) -> Result<ApprovalRequest> {
        Ok(self.gate.get(token)?)
    }

    /// Execute an APPROVED request.
    pub async fn execute_reclamation(&self, token: Uuid) -> Result<BatchOutcome> {
        self.execute_reclamation_with_cancel(token, CancelHandle::new())
            .await
    }

    pub async fn execute_reclamation_with_cancel(
        &self,
        token: Uuid,
        cancel: CancelHandle,
    ) -> Result<BatchOutcome> {
        self.audit_event("execution_started", Some(token), json!({}))?;

        let outcome = match self.executor.execute_with_cancel(token, cancel).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.audit_event(
                    "execution_refused",
                    Some(token),
                    json!({"error": err.to_string()}),
                )?;
                return Err(err.into());
            }
        };

        self.audit_event(
            "execution_finished",
            Some(token),
            json!({
                "state": outcome.request.state,
                "succeeded": outcome.succeeded(),
                "failed": outcome.failed(),
                "results": outcome.results.clone(),
            }),
        )?;
        Ok(outcome)
    }

    fn audit_event(&self, event: &str, token: Option<Uuid>, detail: serde_json::Value) -> Result<()> {
        if let Some(audit) = &self.audit {
            audit
                .record(event, token, detail)
                .with_context(|| format!("appending audit event {event}"))?;
        }
        Ok(())
    }
}
