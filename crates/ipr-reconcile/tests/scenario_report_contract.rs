use ipr_reconcile::{build_report, Confidence, StaleEntry};

fn entry(address: &str, id: i64) -> StaleEntry {
    StaleEntry {
        address: address.to_string(),
        registry_id: id,
        last_seen: "unknown".to_string(),
        device: "none".to_string(),
        confidence: Confidence::High,
        reason: "not found in any evidence source".to_string(),
    }
}

#[test]
fn scenario_rate_is_zero_when_nothing_is_allocated() {
    let report = build_report(Vec::new(), "10.0.1.0/24", Some(0));
    assert_eq!(report.summary.reclamation_rate, 0.0);
    assert_eq!(report.summary.total_allocated, 0);
    assert_eq!(report.summary.total_stale, 0);

    let report = build_report(Vec::new(), "10.0.1.0/24", None);
    assert_eq!(report.summary.reclamation_rate, 0.0);
}

#[test]
fn scenario_stale_count_always_matches_entry_list() {
    let report = build_report(
        vec![entry("10.0.1.15/24", 4), entry("10.0.1.22/24", 5)],
        "10.0.1.0/24",
        Some(8),
    );
    assert_eq!(report.summary.total_stale as usize, report.stale_ips.len());
    assert_eq!(report.summary.reclamation_rate, 25.0);
    assert_eq!(
        report.stale_addresses(),
        vec!["10.0.1.15/24".to_string(), "10.0.1.22/24".to_string()]
    );
}

/// The serialized report is a published contract; key names must not drift.
#[test]
fn scenario_report_serializes_with_contract_keys() {
    let report = build_report(vec![entry("10.0.1.15/24", 42)], "10.0.1.0/24", Some(6));
    let value = serde_json::to_value(&report).expect("serialize report");

    for key in [
        "report_id",
        "generated_at",
        "prefix",
        "summary",
        "stale_ips",
        "recommended_action",
    ] {
        assert!(value.get(key).is_some(), "missing top-level key {key}");
    }

    let summary = value.get("summary").expect("summary");
    for key in ["total_allocated", "total_stale", "reclamation_rate"] {
        assert!(summary.get(key).is_some(), "missing summary key {key}");
    }

    let first = &value["stale_ips"][0];
    for key in ["address", "netbox_id", "last_seen", "device", "confidence", "reason"] {
        assert!(first.get(key).is_some(), "missing stale_ips key {key}");
    }
    assert_eq!(first["netbox_id"], 42);
    assert_eq!(first["confidence"], "high");

    // generated_at renders as an RFC3339 UTC timestamp.
    let generated_at = value["generated_at"].as_str().expect("generated_at string");
    assert!(generated_at.ends_with('Z'), "not UTC: {generated_at}");

    // The id is derived from generation time.
    assert!(report.report_id.starts_with("reclaim-"));
}
