//! Integration tests for the factgraph CLI
//!
//! These run the binary against component files in a temp dir.
//! Only `check` and `compute --dry-run` are used, so nothing touches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn factgraph_cmd() -> Command {
    let mut cmd = Command::cargo_bin("factgraph").unwrap();
    cmd.env("RUST_LOG", "error").env("NO_COLOR", "1");
    cmd
}

fn write_component(dir: &TempDir, yaml: &str) -> PathBuf {
    let file = dir.path().join("component.yaml");
    fs::write(&file, yaml).unwrap();
    file
}

const COMPONENT: &str = r#"
apiVersion: of-catalog/v1alpha1
kind: Component
metadata:
  name: payments
  componentType: service
spec:
  name: payments
  metricSources:
    readme-present:
      metric: readme-present
      facts:
        - id: readme
          type: extract
          source: github
          repo: ${Metadata.Name}
          filePath: README.md
          rule: notempty
    replica-count:
      metric: replica-count
      facts:
        - id: replicas
          type: extract
          source: github
          repo: ${Metadata.Name}
          filePath: values.json
          rule: jsonpath
          jsonPath: .replicas
        - id: total
          type: aggregate
          method: sum
          dependsOn: [replicas]
"#;

const BROKEN_COMPONENT: &str = r#"
metadata:
  name: payments
spec:
  metricSources:
    looping:
      facts:
        - id: a
          type: extract
          source: jsonapi
          uri: https://svc/a
          dependsOn: [b]
        - id: b
          type: extract
          source: jsonapi
          uri: https://svc/b
          dependsOn: [a]
"#;

// ============================================================================
// HELP
// ============================================================================

#[test]
fn test_help_flag() {
    factgraph_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compute"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_compute_help() {
    factgraph_cmd()
        .args(["compute", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--metric"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ============================================================================
// CHECK
// ============================================================================

#[test]
fn test_check_valid_component() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, COMPONENT);

    factgraph_cmd()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("readme-present"))
        .stdout(predicate::str::contains("sink: total"));
}

#[test]
fn test_check_reports_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, BROKEN_COMPONENT);

    factgraph_cmd()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FACT-002"))
        .stderr(predicate::str::contains("failed checks"));
}

#[test]
fn test_check_missing_file() {
    factgraph_cmd()
        .args(["check", "/nonexistent/component.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_check_invalid_yaml() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, "metadata: [unclosed");

    factgraph_cmd()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

// ============================================================================
// COMPUTE (dry run)
// ============================================================================

#[test]
fn test_compute_dry_run_single_metric() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, COMPONENT);

    // Empty sources: the README is a soft miss, so notempty gives false
    factgraph_cmd()
        .args(["compute", "--dry-run", "--metric", "readme-present"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("readme-present = 0"));
}

#[test]
fn test_compute_dry_run_all_with_facts() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, COMPONENT);

    factgraph_cmd()
        .args(["compute", "--dry-run", "--all", "--show-facts"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("readme-present = 0"))
        .stdout(predicate::str::contains("replica-count = 0"))
        .stdout(predicate::str::contains("replicas [extract]"));
}

#[test]
fn test_compute_all_continues_past_failures() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, BROKEN_COMPONENT);

    factgraph_cmd()
        .args(["compute", "--dry-run", "--all"])
        .arg(&file)
        .assert()
        .success()
        .stderr(predicate::str::contains("looping (graph rejected, nothing fetched)"))
        .stdout(predicate::str::contains("1 of 1 metrics failed"));
}

#[test]
fn test_compute_all_survives_unknown_method() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(
        &temp_dir,
        r#"
metadata:
  name: payments
spec:
  metricSources:
    average:
      facts:
        - id: readme
          type: extract
          source: github
          repo: payments
          filePath: README.md
          rule: notempty
        - id: avg
          type: aggregate
          method: avg
          dependsOn: [readme]
    readme-present:
      facts:
        - id: readme
          type: extract
          source: github
          repo: payments
          filePath: README.md
          rule: notempty
"#,
    );

    // The unknown method only leaves its own sink unset
    factgraph_cmd()
        .args(["compute", "--dry-run", "--all"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("average = 0"))
        .stdout(predicate::str::contains("readme-present = 0"));
}

#[test]
fn test_check_accepts_unknown_rule() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(
        &temp_dir,
        r#"
metadata:
  name: payments
spec:
  metricSources:
    versioned:
      facts:
        - id: version
          type: extract
          source: github
          repo: payments
          filePath: VERSION
          rule: xpath
"#,
    );

    factgraph_cmd()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("versioned (1 facts, sink: version)"));
}

#[test]
fn test_compute_unknown_metric() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, COMPONENT);

    factgraph_cmd()
        .args(["compute", "--dry-run", "--metric", "coverage"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FACT-094"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_compute_requires_metric_or_all() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_component(&temp_dir, COMPONENT);

    factgraph_cmd()
        .args(["compute", "--dry-run"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("readme-present, replica-count"));
}
