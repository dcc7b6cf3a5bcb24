//! CLI Integration Tests
//!
//! Drives the `xlsx-reporting` binary with assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{Table, TableColumn, Workbook};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_template(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Report").unwrap();
    let columns = vec![
        TableColumn::new().set_header("Region"),
        TableColumn::new().set_header("Total"),
    ];
    let table = Table::new().set_name("Totals").set_columns(&columns);
    sheet.add_table(2, 1, 4, 2, &table).unwrap();
    sheet.write_string(2, 1, "Region").unwrap();
    sheet.write_string(2, 2, "Total").unwrap();
    workbook.save(path).unwrap();
}

/// Default folder layout of the tool, rooted at a temp dir
fn project(csv: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("inputs/input_files")).unwrap();
    fs::create_dir_all(root.join("inputs/xlsx_templates")).unwrap();
    fs::create_dir_all(root.join("outputs")).unwrap();
    write_template(&root.join("inputs/xlsx_templates/totals.xlsx"));
    fs::write(root.join("inputs/input_files/totals.csv"), csv).unwrap();
    fs::write(
        root.join("inputs/settings.yaml"),
        r#"
output_from_input_dict:
  totals.xlsx:
    tables:
      Totals:
        totals.csv:
          column_mapping:
            region: Region
            total: Total
"#,
    )
    .unwrap();
    dir
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("xlsx-reporting"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("xlsx-reporting"));
}

#[test]
fn test_run_help_lists_folders() {
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--xlsx-templates-folder"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_with_default_layout() {
    let dir = project("region,total\nnorth,10\nsouth,20\neast,30\nwest,40\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["run", "-d", "2024-12-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("totals.xlsx"))
        .stdout(predicate::str::contains("B3:C7"));

    assert!(dir.path().join("outputs/totals.xlsx").is_file());

    let mut inspect = Command::cargo_bin("xlsx-reporting").unwrap();
    inspect
        .current_dir(dir.path())
        .args(["inspect", "outputs/totals.xlsx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Totals"))
        .stdout(predicate::str::contains("B3:C7"));
}

#[test]
fn test_run_dry_run() {
    let dir = project("region,total\nnorth,10\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    assert!(!dir.path().join("outputs/totals.xlsx").exists());
}

#[test]
fn test_run_failed_template_exits_nonzero() {
    let dir = project("region,amount\nnorth,10\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"));

    assert!(!dir.path().join("outputs/totals.xlsx").exists());
}

#[test]
fn test_run_invalid_date() {
    let dir = project("region,total\nnorth,10\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["run", "-d", "31-12-2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid report date"));
}

#[test]
fn test_run_missing_config() {
    let dir = project("region,total\nnorth,10\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["run", "-c", "nope.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file"));
}

#[test]
fn test_run_writes_log_file() {
    let dir = project("region,total\nnorth,10\n");
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["run", "--log-dir", "logs"])
        .assert()
        .success();

    let logs: Vec<_> = fs::read_dir(dir.path().join("logs")).unwrap().collect();
    assert_eq!(logs.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_inspect_missing_workbook() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("xlsx-reporting").unwrap();
    cmd.current_dir(dir.path())
        .args(["inspect", "missing.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.xlsx"));
}
