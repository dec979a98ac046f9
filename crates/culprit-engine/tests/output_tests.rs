use chrono::{TimeZone, Utc};
use culprit_engine::feature::ChangedFile;
use culprit_engine::model::{ChangeLog, Contributor, Culprit, Suspect, ALGORITHM_CORE};
use culprit_engine::output::{
    read_analysis_input, read_culprit_report, render_terminal_summary, validate_path,
    write_culprit,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn create_test_culprit() -> Culprit {
    let time = Utc.with_ymd_and_hms(2016, 8, 10, 9, 12, 44).unwrap();
    let changelog = ChangeLog {
        author: Contributor::new("Alice", "alice@chromium.org", time),
        committer: Contributor::new("Bot", "commit-bot@chromium.org", time),
        revision: "1a2b3c".to_string(),
        commit_position: Some(411532),
        message: "Fix".to_string(),
        touched_files: vec![],
        commit_url: "https://repo/+/1a2b3c".to_string(),
        code_review_url: Some("https://review/123".to_string()),
        reverted_revision: None,
    };
    let mut suspect = Suspect::new(changelog, "src/");
    suspect.confidence = 0.75;
    suspect.reasons = vec!["MinDistance: -0.29 -- Minimum distance is 12".to_string()];
    suspect.changed_files = vec![ChangedFile::new(
        "a/f.cc",
        Some("https://repo/+blame/8/a/f.cc#177".to_string()),
        vec!["Distance is 12".to_string(), "Touched crashed file".to_string()],
    )];

    Culprit {
        project: "chromium".to_string(),
        components: vec!["Blink>DOM".to_string()],
        suspected_cls: vec![suspect],
        regression_range: Some(("50.0.1.0".to_string(), "50.0.2.0".to_string())),
        algorithm: ALGORITHM_CORE.to_string(),
    }
}

#[test]
fn test_write_and_read_culprit() {
    let culprit = create_test_culprit();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    write_culprit(&culprit, path).unwrap();
    let loaded = read_culprit_report(path).unwrap();

    let (result, tags) = culprit.to_dicts();
    assert_eq!(loaded.version, "1.0.0");
    assert_eq!(loaded.result, result);
    assert_eq!(loaded.tags, tags);
}

#[test]
fn test_culprit_wire_format() {
    let culprit = create_test_culprit();
    let temp_file = NamedTempFile::new().unwrap();
    write_culprit(&culprit, temp_file.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_file.path()).unwrap()).unwrap();

    assert_eq!(json["result"]["found"], true);
    assert_eq!(json["result"]["regression_range"], serde_json::json!(["50.0.1.0", "50.0.2.0"]));
    assert_eq!(json["result"]["suspected_project"], "chromium");
    assert_eq!(json["result"]["suspected_components"], serde_json::json!(["Blink>DOM"]));

    let cl = &json["result"]["suspected_cls"][0];
    assert_eq!(cl["revision"], "1a2b3c");
    assert_eq!(cl["url"], "https://repo/+/1a2b3c");
    assert_eq!(cl["review_url"], "https://review/123");
    assert_eq!(cl["project_path"], "src/");
    assert_eq!(cl["author"], "alice@chromium.org");
    assert_eq!(cl["time"], "Wed Aug 10 09:12:44 2016");
    assert_eq!(cl["confidence"], 0.75);
    assert_eq!(cl["changed_files"][0]["file"], "a/f.cc");
    assert_eq!(cl["changed_files"][0]["blame_url"], "https://repo/+blame/8/a/f.cc#177");
    assert_eq!(cl["changed_files"][0]["info"], "Distance is 12\nTouched crashed file");

    assert_eq!(
        json["tags"],
        serde_json::json!({
            "found_suspects": true,
            "has_regression_range": true,
            "found_project": true,
            "found_components": true,
            "solution": "core_algorithm"
        })
    );
}

#[test]
fn test_validate_output_path_empty() {
    assert!(validate_path(Path::new("")).is_err());
}

#[test]
fn test_validate_output_path_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(validate_path(temp_dir.path()).is_err());
}

#[test]
fn test_write_creates_parent_dirs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("out").join("nested").join("culprit.json");

    write_culprit(&create_test_culprit(), &nested).unwrap();
    assert!(nested.exists());
}

#[test]
fn test_read_analysis_input_rejects_unknown_fields() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"crashed_version": "1", "stacktrace": {{"stacks": []}}, "bogus": 1}}"#
    )
    .unwrap();

    assert!(read_analysis_input(file.path()).is_err());
}

#[test]
fn test_read_minimal_analysis_input() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "crashed_version": "50.0.0.0",
            "stacktrace": {{
                "stacks": [{{
                    "priority": 0,
                    "frames": [{{"index": 0, "dep_path": "src/", "file_path": "a/f0.cc", "crashed_line_numbers": "177:2"}}]
                }}]
            }}
        }}"#
    )
    .unwrap();

    let input = read_analysis_input(file.path()).unwrap();
    assert_eq!(input.signature, "");
    assert!(input.regression_range.is_none());
    let frame = &input.stacktrace.stacks[0].frames[0];
    assert_eq!(frame.crashed_line_numbers, vec![177, 178, 179]);
    assert_eq!(input.stacktrace.crash_stack().map(|stack| stack.priority), Some(0));
}

#[test]
fn test_terminal_summary() {
    colored::control::set_override(false);
    let summary = render_terminal_summary(&create_test_culprit());

    assert!(summary.contains("Regression range: 50.0.1.0 .. 50.0.2.0"));
    assert!(summary.contains("Project:    chromium"));
    assert!(summary.contains("1. 1a2b3c src/ (0.75) by alice@chromium.org"));
    assert!(summary.contains("https://repo/+blame/8/a/f.cc#177"));
    assert!(summary.contains("SUSPECTS FOUND"));
}
