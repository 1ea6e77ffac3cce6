// Tests for report generation functionality

use std::time::Duration;

use slingshot_core::crawl::CrawlSession;
use slingshot_core::report::{
    ReportFormat, generate_detailed_json, generate_results_csv, generate_structure_json,
    generate_tree_text, save_report,
};
use slingshot_scanner::{CrawlOutcome, CrawlStats, Node, NodeKind, RecordKind, RequestRecord};

// ============================================================================
// Fixtures
// ============================================================================

fn node(path: &str, kind: NodeKind, children: Vec<Node>) -> Node {
    Node {
        path: path.to_string(),
        kind,
        status: Some(200),
        size_bytes: Some(64),
        content_type: None,
        primary_type: None,
        downloaded_to: None,
        error: None,
        children,
    }
}

fn sample_tree() -> Node {
    let mut root = node(
        "/",
        NodeKind::Folder,
        vec![
            node("/content", NodeKind::Folder, vec![
                node("/content/logo.png", NodeKind::Asset, vec![]),
            ]),
            node("/apps", NodeKind::Folder, vec![]),
        ],
    );
    root.children[0].children[0].primary_type = Some("dam:Asset".to_string());
    root
}

fn sample_records() -> Vec<RequestRecord> {
    vec![
        RequestRecord {
            timestamp: "2026-08-04T12:00:00Z".to_string(),
            kind: RecordKind::Folder,
            url: "http://target/.1.json".to_string(),
            status: Some(200),
            size_bytes: 128,
            message: None,
        },
        RequestRecord {
            timestamp: "2026-08-04T12:00:01Z".to_string(),
            kind: RecordKind::Error,
            url: "http://target/broken/.1.json".to_string(),
            status: None,
            size_bytes: 0,
            message: Some("connection failed: reset, by peer".to_string()),
        },
    ]
}

fn sample_session() -> CrawlSession {
    CrawlSession {
        session_id: "test-session".to_string(),
        target: "http://target".to_string(),
        outcome: CrawlOutcome {
            tree: sample_tree(),
            stats: CrawlStats {
                folders: 3,
                assets: 1,
                unknown: 0,
                errors: 1,
                requests: 5,
                bytes_downloaded: 64,
            },
            records: sample_records(),
            elapsed: Duration::from_secs(2),
        },
    }
}

fn collect_paths(node: &Node, out: &mut Vec<(String, NodeKind)>) {
    out.push((node.path.clone(), node.kind));
    for child in &node.children {
        collect_paths(child, out);
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str_json() {
    assert!(matches!(
        ReportFormat::from_str("json"),
        Some(ReportFormat::Json)
    ));
}

#[test]
fn test_report_format_from_str_csv() {
    assert!(matches!(
        ReportFormat::from_str("csv"),
        Some(ReportFormat::Csv)
    ));
}

#[test]
fn test_report_format_from_str_tree() {
    assert!(matches!(
        ReportFormat::from_str("tree"),
        Some(ReportFormat::Tree)
    ));
    assert!(matches!(
        ReportFormat::from_str("txt"),
        Some(ReportFormat::Tree)
    ));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(
        ReportFormat::from_str("JSON"),
        Some(ReportFormat::Json)
    ));
    assert!(matches!(
        ReportFormat::from_str("Csv"),
        Some(ReportFormat::Csv)
    ));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("html").is_none());
    assert!(ReportFormat::from_str("pdf").is_none());
}

#[test]
fn test_report_format_file_names() {
    assert_eq!(
        ReportFormat::Json.file_name("20260804_120000"),
        "structure_20260804_120000.json"
    );
    assert_eq!(
        ReportFormat::Csv.file_name("20260804_120000"),
        "results_20260804_120000.csv"
    );
    assert_eq!(
        ReportFormat::Tree.file_name("20260804_120000"),
        "tree_20260804_120000.txt"
    );
}

// ============================================================================
// Structure JSON Tests
// ============================================================================

#[test]
fn test_structure_json_round_trips_paths_and_kinds() {
    let tree = sample_tree();
    let json = generate_structure_json(&tree).unwrap();

    let reparsed: Node = serde_json::from_str(&json).unwrap();

    let mut original = Vec::new();
    collect_paths(&tree, &mut original);
    let mut round_tripped = Vec::new();
    collect_paths(&reparsed, &mut round_tripped);

    original.sort();
    round_tripped.sort();
    assert_eq!(original, round_tripped);
}

#[test]
fn test_structure_json_omits_empty_fields() {
    let tree = node("/", NodeKind::Folder, vec![]);
    let json = generate_structure_json(&tree).unwrap();

    assert!(!json.contains("downloaded_to"));
    assert!(!json.contains("error"));
    assert!(!json.contains("children"));
}

// ============================================================================
// CSV Tests
// ============================================================================

#[test]
fn test_csv_header_and_row_count() {
    let csv = generate_results_csv(&sample_records());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "timestamp,kind,status,size,url,message");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_csv_row_fields() {
    let csv = generate_results_csv(&sample_records());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines[1],
        "2026-08-04T12:00:00Z,folder,200,128,http://target/.1.json,"
    );
}

#[test]
fn test_csv_quotes_fields_with_commas() {
    let csv = generate_results_csv(&sample_records());

    assert!(csv.contains("\"connection failed: reset, by peer\""));
}

#[test]
fn test_csv_error_row_has_empty_status() {
    let csv = generate_results_csv(&sample_records());
    let lines: Vec<&str> = csv.lines().collect();

    assert!(lines[2].starts_with("2026-08-04T12:00:01Z,error,,0,"));
}

// ============================================================================
// ASCII Tree Tests
// ============================================================================

#[test]
fn test_tree_text_rendering() {
    let text = generate_tree_text(&sample_tree());

    let expected = "\
/ (folder)
├── content (folder)
│   └── logo.png (dam:Asset)
└── apps (folder)
";
    assert_eq!(text, expected);
}

#[test]
fn test_tree_text_shows_errors() {
    let mut root = node("/", NodeKind::Folder, vec![node("/x", NodeKind::Unknown, vec![])]);
    root.children[0].error = Some(slingshot_scanner::NodeError::Http(403));

    let text = generate_tree_text(&root);
    assert!(text.contains("└── x (HTTP 403)"));
}

// ============================================================================
// Detailed Report Tests
// ============================================================================

#[test]
fn test_detailed_json_envelope() {
    let session = sample_session();
    let json = generate_detailed_json(&session).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["meta"]["generator"], "slingshot");
    assert_eq!(value["meta"]["session_id"], "test-session");
    assert_eq!(value["meta"]["target"], "http://target");
    assert_eq!(value["stats"]["folders"], 3);
    assert_eq!(value["stats"]["errors"], 1);
    assert_eq!(value["structure"]["path"], "/");
    assert_eq!(value["results"].as_array().unwrap().len(), 2);
}

// ============================================================================
// File Output Tests
// ============================================================================

#[test]
fn test_save_report_writes_content() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("report.txt");

    save_report("hello", &target).unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
}

#[test]
fn test_write_default_reports_creates_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let session = sample_session();

    let written = slingshot_core::report::write_default_reports(&session, dir.path()).unwrap();

    assert_eq!(written.len(), 3);
    for path in &written {
        assert!(path.is_file(), "missing report {}", path.display());
    }
}
