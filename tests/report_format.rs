use gemmbench::report::RunReport;
use gemmbench::timing::StageRecord;
use gemmbench::verify::VerificationResult;

fn sample_report(mismatches: usize) -> RunReport {
    RunReport {
        name: "matmul".to_string(),
        backend: "sim".to_string(),
        detail: Some("in-process simulated device".to_string()),
        stages: vec![
            StageRecord {
                label: "setup".to_string(),
                duration_ms: 1.25,
            },
            StageRecord {
                label: "execute".to_string(),
                duration_ms: 0.5,
            },
        ],
        verification: VerificationResult {
            mismatches,
            max_abs_diff: if mismatches == 0 { 0.0 } else { 4.0 },
        },
        total_ms: 2.0,
    }
}

#[test]
fn render_puts_stages_between_the_header_and_the_total() {
    let report = sample_report(0);
    let rendered = report.render();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "backend: sim (in-process simulated device)");
    assert!(lines[1].starts_with("setup"), "got: {}", lines[1]);
    assert!(lines[1].ends_with("ms"), "got: {}", lines[1]);
    assert!(lines[2].starts_with("execute"), "got: {}", lines[2]);
    assert_eq!(lines[3], "matmul done: all results correct");
    assert!(lines[4].starts_with("total"), "got: {}", lines[4]);
}

#[test]
fn render_reports_the_error_count_when_verification_fails() {
    let report = sample_report(3);
    let rendered = report.render();
    assert!(rendered.contains("matmul done with 3 errors"), "got: {rendered}");
    assert!(!rendered.contains("all results correct"));
}

#[test]
fn render_omits_the_detail_clause_when_absent() {
    let mut report = sample_report(0);
    report.detail = None;
    let rendered = report.render();
    assert!(rendered.starts_with("backend: sim\n"), "got: {rendered}");
}

#[test]
fn stage_lookup_finds_recorded_labels_only() {
    let report = sample_report(0);
    assert_eq!(report.stage_ms("setup"), Some(1.25));
    assert_eq!(report.stage_ms("execute"), Some(0.5));
    assert_eq!(report.stage_ms("transfer in"), None);
    assert_eq!(report.stage_total_ms(), 1.75);
}

#[test]
fn report_survives_a_json_round_trip() {
    let report = sample_report(0);
    let encoded = serde_json::to_string_pretty(&report).expect("encode");
    assert!(encoded.contains("\"backend\": \"sim\""), "got: {encoded}");
    let decoded: RunReport = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded.name, report.name);
    assert_eq!(decoded.backend, report.backend);
    assert_eq!(decoded.detail, report.detail);
    assert_eq!(decoded.verification, report.verification);
    assert_eq!(decoded.total_ms, report.total_ms);
    assert_eq!(decoded.stages.len(), report.stages.len());
}
