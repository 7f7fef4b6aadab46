use magpie_rs_recon::core::models::{ScanSummary, UsernameReport, Verdict};

#[test]
fn summary_formats_success_rate_to_one_decimal() {
    let summary = ScanSummary::new("alice", 4, 3, 1);
    assert_eq!(summary.total_checked, 4);
    assert_eq!(summary.found, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.success_rate, "75.0%");
}

#[test]
fn summary_of_empty_catalog_is_zero_not_nan() {
    let summary = ScanSummary::new("alice", 0, 0, 0);
    assert_eq!(summary.success_rate, "0.0%");
}

#[test]
fn summary_of_one_third_rounds() {
    let summary = ScanSummary::new("alice", 3, 1, 0);
    assert_eq!(summary.success_rate, "33.3%");
}

#[test]
fn verdict_serializes_with_a_tag() {
    let found = Verdict::Found {
        url: "https://example.com/alice".to_string(),
        status_code: 200,
    };
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(json["verdict"], "found");
    assert_eq!(json["status_code"], 200);

    let not_found = serde_json::to_value(Verdict::NotFound).unwrap();
    assert_eq!(not_found["verdict"], "not_found");
}

#[test]
fn report_round_trips_through_json() {
    let report = UsernameReport {
        summary: ScanSummary::new("alice", 2, 1, 0),
        failed_sites: vec!["Broken".to_string()],
        ..Default::default()
    };
    let json = serde_json::to_string(&report).unwrap();
    let back: UsernameReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.summary, report.summary);
    assert_eq!(back.failed_sites, report.failed_sites);
    assert!(back.error.is_none());
}
