use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StaleEntry;

/// Process-wide report sequence. Report ids embed a wall-clock second plus
/// this counter, which keeps them unique even at sub-second generation rates.
static REPORT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Aggregate numbers for a reclamation report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_allocated: u64,
    pub total_stale: u64,
    /// Percentage, two decimals. Always 0.0 when nothing is allocated.
    pub reclamation_rate: f64,
}

/// Immutable reclamation report artifact.
///
/// The serialized field names are a published contract: `report_id`,
/// `generated_at`, `prefix`, `summary`, `stale_ips`, `recommended_action`.
/// Building a report never mutates an existing one; a new pass always yields
/// a new object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclamationReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub prefix: String,
    pub summary: ReportSummary,
    pub stale_ips: Vec<StaleEntry>,
    pub recommended_action: String,
}

impl ReclamationReport {
    /// CIDR strings of every stale entry, in report order. This is the value
    /// handed to the mutation gate when an operator proposes reclamation.
    pub fn stale_addresses(&self) -> Vec<String> {
        self.stale_ips.iter().map(|e| e.address.clone()).collect()
    }

    pub fn has_stale(&self) -> bool {
        !self.stale_ips.is_empty()
    }
}

/// Wrap classified entries into a report artifact.
///
/// `total_allocated` of `None` or zero yields a rate of 0.0 rather than a
/// division fault. Two calls with identical inputs differ only in
/// `report_id` / `generated_at`.
pub fn build_report(
    entries: Vec<StaleEntry>,
    prefix: &str,
    total_allocated: Option<usize>,
) -> ReclamationReport {
    let now = Utc::now();
    let total = total_allocated.unwrap_or(0);
    let stale = entries.len();

    let rate = if total > 0 {
        round2((stale as f64 / total as f64) * 100.0)
    } else {
        0.0
    };

    let recommended_action = if stale > 0 {
        "Review stale IPs and execute reclamation".to_string()
    } else {
        "No stale addresses detected; no action required".to_string()
    };

    ReclamationReport {
        report_id: next_report_id(now),
        generated_at: now,
        prefix: prefix.to_string(),
        summary: ReportSummary {
            total_allocated: total as u64,
            total_stale: stale as u64,
            reclamation_rate: rate,
        },
        stale_ips: entries,
        recommended_action,
    }
}

fn next_report_id(now: DateTime<Utc>) -> String {
    let seq = REPORT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("reclaim-{}-{:04}", now.format("%Y%m%d-%H%M%S"), seq)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_are_monotonically_unique() {
        let a = build_report(Vec::new(), "10.0.1.0/24", None);
        let b = build_report(Vec::new(), "10.0.1.0/24", None);
        assert_ne!(a.report_id, b.report_id);
    }

    #[test]
    fn rate_rounds_to_two_decimals() {
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(50.0), 50.0);
    }
}
