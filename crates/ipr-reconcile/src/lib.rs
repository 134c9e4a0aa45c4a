//! ipr-reconcile
//!
//! Reconciliation engine + report builder.
//!
//! Architectural decisions:
//! - Registry allocations vs probe evidence comparison is a pure function
//! - Any live evidence for an address dominates down/absent evidence
//! - Malformed address strings fail the whole pass (silent skips would
//!   understate drift)
//! - Output order follows input allocation order for diffable reports
//!
//! Deterministic, pure logic. No IO. No registry or device calls.

mod engine;
mod report;
mod types;

pub use engine::{bare_ip, classify};
pub use report::{build_report, ReclamationReport, ReportSummary};
pub use types::{Confidence, EvidenceIndex, InvalidAddressError, StaleEntry};
