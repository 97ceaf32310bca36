//! Integration tests for the Trackport CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a trackport command isolated from the user's config
fn trackport(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("trackport").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".xdg"))
        .env("NO_GRAPHICS", "1")
        .env_remove("TRACKPORT_DB")
        .env_remove("TRACKPORT_DIALECT")
        .env_remove("TRACKPORT_LOG");
    cmd
}

/// Helper to create a workspace with a "web" project that alice belongs to
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp).arg("init").assert().success();

    let steps: &[&[&str]] = &[
        &["catalog", "project", "web", "Website"],
        &["catalog", "project", "api", "API"],
        &["catalog", "user", "alice", "--name", "Alice"],
        &["catalog", "user", "bob"],
        &["catalog", "member", "web", "alice"],
        &["catalog", "tracker", "Bug", "--project", "web"],
        &["catalog", "status", "New", "--default"],
        &["catalog", "status", "Open"],
        &["catalog", "priority", "Normal", "--default"],
        &["catalog", "version", "web", "1.0"],
    ];
    for args in steps {
        trackport(&tmp).args(*args).assert().success();
    }
    tmp
}

fn write_csv(tmp: &TempDir, name: &str, contents: &str) {
    fs::write(tmp.path().join(name), contents).unwrap();
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("trackport"));
}

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized Trackport workspace"));

    assert!(tmp.path().join(".trackport/config.yaml").exists());
    assert!(tmp.path().join(".trackport/tracker.db").exists());
}

#[test]
fn test_init_twice_reports_existing() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp).arg("init").assert().success();
    trackport(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .args(["issues", "web"])
        .assert()
        .failure();
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_duplicate_project_rejected() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args(["catalog", "project", "web", "Again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_member_requires_known_user() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args(["catalog", "member", "web", "carol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_list_field_requires_values() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args(["catalog", "field", "Team", "--format", "list", "--for-all"])
        .assert()
        .failure();
}

#[test]
fn test_catalog_show_json() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args(["catalog", "show", "web", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"members\""))
        .stdout(predicate::str::contains("\"alice\""))
        .stdout(predicate::str::contains("\"default_status\": \"New\""));
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_all_rows() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Estimated hours,Version\n\
         alice,Fix login crash,Bug,2.5,1.0\n\
         alice,Add logout button,Bug,,\n",
    );

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CSV Import Successful, 2 new issues have been created",
        ));

    trackport(&tmp)
        .args(["issues", "web", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix login crash"))
        .stdout(predicate::str::contains("Add logout button"));
}

#[test]
fn test_import_partial_success() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Status\nalice,Fix crash,Bug,\nbob,Fix crash,Bug,Open\n",
    );

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 of 2 issues were created"))
        .stderr(predicate::str::contains(
            "Line 2: User 'bob' is not a member of the project",
        ));

    // The valid row stays saved
    trackport(&tmp)
        .args(["issues", "web", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"author\": \"alice\""))
        .stdout(predicate::str::contains("\"status\": \"New\""));
}

#[test]
fn test_import_reports_every_row_error() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Version\n\
         alice,One,Task,\n\
         alice,Two,Bug,Beta\n\
         alice,Three,Task,\n",
    );

    let output = trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Line 1: Tracker 'Task' is invalid or not assigned to this project"));
    assert!(stderr.contains("Line 2: Version 'Beta' is invalid"));
    // Repeated messages are reported once
    assert!(!stderr.contains("Line 3:"));
}

#[test]
fn test_import_lists_every_saved_row_with_bad_created() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Created\n\
         alice,One,Bug,yesterday\n\
         alice,Two,Bug,yesterday\n\
         alice,Three,Bug,yesterday\n",
    );

    let output = trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    for (line, id) in [(1, 1), (2, 2), (3, 3)] {
        assert!(stderr.contains(&format!(
            "Line {}: Created is not a valid date (issue #{} was saved)",
            line, id
        )));
    }
}

#[test]
fn test_issues_tsv_quotes_tabs() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker\nalice,\"Split\there\",Bug\n",
    );
    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .success();

    let output = trackport(&tmp)
        .args(["issues", "web", "-f", "tsv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let row = stdout.lines().nth(1).unwrap();
    assert!(row.contains("\"Split\there\""));
}

#[test]
fn test_import_missing_required_header() {
    let tmp = setup_workspace();
    write_csv(&tmp, "issues.csv", "Subject,Status\nFix crash,New\n");

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required fields: Author, Tracker"));

    trackport(&tmp)
        .args(["issues", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_import_custom_field_of_other_project() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args([
            "catalog", "field", "Team", "--format", "list", "--values", "Red,Blue", "--project",
            "api",
        ])
        .assert()
        .success();
    write_csv(&tmp, "issues.csv", "Author,Subject,Tracker,Team\nalice,Fix,Bug,Red\n");

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid or not assigned to project"))
        .stderr(predicate::str::contains("Team"));
}

#[test]
fn test_import_custom_field_value() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args([
            "catalog", "field", "Team", "--format", "list", "--values", "Red,Blue", "--project",
            "web",
        ])
        .assert()
        .success();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Team\nalice,Fix,Bug,Red\nalice,Other,Bug,Green\n",
    );

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line 2: Team has an invalid value"));
}

#[test]
fn test_import_without_file() {
    let tmp = setup_workspace();
    trackport(&tmp)
        .args(["import", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a CSV file."));
}

#[test]
fn test_import_empty_file() {
    let tmp = setup_workspace();
    write_csv(&tmp, "empty.csv", "");

    trackport(&tmp)
        .args(["import", "web", "empty.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSV is empty."));
}

#[test]
fn test_import_unknown_project() {
    let tmp = setup_workspace();
    write_csv(&tmp, "issues.csv", "Author,Subject,Tracker\nalice,Fix,Bug\n");

    trackport(&tmp)
        .args(["import", "mobile", "issues.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_dry_run_creates_nothing() {
    let tmp = setup_workspace();
    write_csv(&tmp, "issues.csv", "Author,Subject,Tracker\nalice,Fix,Bug\n");

    trackport(&tmp)
        .args(["import", "web", "issues.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV Import Successful, 1 new issues have been created"))
        .stdout(predicate::str::contains("Dry run complete"));

    trackport(&tmp)
        .args(["issues", "web", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));

    trackport(&tmp)
        .args(["history", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No imports recorded"));
}

#[test]
fn test_import_json_output() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker\nalice,One,Bug\nbob,Two,Bug\n",
    );

    let output = trackport(&tmp)
        .args(["import", "web", "issues.csv", "-f", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["dry_run"], false);
    assert_eq!(json["summary"], "1 of 2 issues were created");
    assert_eq!(json["report"][0]["line"], 2);
    assert_eq!(
        json["report"][0]["message"],
        "User 'bob' is not a member of the project"
    );
}

#[test]
fn test_basic_dialect_ignores_priority_column() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker,Priority\nalice,Fix,Bug,High\n",
    );

    // In the basic dialect "Priority" is read as a custom field name
    trackport(&tmp)
        .env("TRACKPORT_DIALECT", "basic")
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid or not assigned to project"));
}

#[test]
fn test_configured_labels() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".trackport/config.yaml"),
        "labels:\n  author: reporter\n",
    )
    .unwrap();
    write_csv(&tmp, "issues.csv", "Reporter,Subject,Tracker\nalice,Fix,Bug\n");

    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .success();
}

// ============================================================================
// Template and History Tests
// ============================================================================

#[test]
fn test_template_outside_workspace() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Author,Subject,Tracker,Description,Assignee,Estimated hours",
        ))
        .stderr(predicate::str::contains("Template generated"));
}

#[test]
fn test_history_records_runs() {
    let tmp = setup_workspace();
    write_csv(
        &tmp,
        "issues.csv",
        "Author,Subject,Tracker\nalice,One,Bug\nbob,Two,Bug\n",
    );
    trackport(&tmp)
        .args(["import", "web", "issues.csv"])
        .assert()
        .failure();

    let output = trackport(&tmp)
        .args(["history", "web", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let runs = json.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["file_name"], "issues.csv");
    assert_eq!(runs[0]["total"], 2);
    assert_eq!(runs[0]["succeeded"], 1);
    assert_eq!(runs[0]["file_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    trackport(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trackport"));
}
