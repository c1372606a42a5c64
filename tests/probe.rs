use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn probe_reports_currency_for_a_csv_column() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(
        &temp,
        "amounts.csv",
        "id,amount\n1,\"$1,234.50\"\n2,$9.99\n3,($15.00)\n",
    );
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", input.to_str().unwrap(), "-c", "amount"])
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : currency"))
        .stdout(predicate::str::contains("$#,##0.00;($#,##0.00)"));
}

#[test]
fn probe_resolves_columns_by_index_without_headers() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "plain.csv", "1,2023-01-15\n2,2023-02-01\n3,2023-12-31\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-c",
            "1",
            "--no-header",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : date"))
        .stdout(predicate::str::contains("%Y-%m-%d"));
}

#[test]
fn probe_reads_one_sample_per_line_without_a_column() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "values.txt", "1\n2\n3\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : integer"));
}

#[test]
fn probe_reads_stdin_when_input_is_dash() {
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", "-"])
        .write_stdin("1.5\n2.25\n3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : number"));
}

#[test]
fn probe_emits_json_reports() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "values.txt", "10\n20\n\n30\n");
    let output = Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", input.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(report["best"]["kind"], "integer");
    assert_eq!(report["best"]["nulls"], 1);
    assert_eq!(report["sample_count"], 4);
    assert_eq!(report["distinct_count"], 4);
    assert!(report["survivors"].as_array().is_some_and(|s| !s.is_empty()));
}

#[test]
fn probe_honors_sample_row_limits() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "values.txt", "1\n2\nnot-a-number\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", input.to_str().unwrap(), "--sample-rows", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : integer"));
}

#[test]
fn probe_rejects_malformed_number_masks() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "values.txt", "1\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "--number-format",
            "#.#.#",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than one decimal point"));
}

#[test]
fn probe_fails_on_unknown_columns() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "plain.csv", "id,amount\n1,2\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["probe", "-i", input.to_str().unwrap(), "-c", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reading column 'missing'"));
}

#[test]
fn probe_supports_eu_locales() {
    let temp = tempdir().expect("temp dir");
    let input = write_fixture(&temp, "values.txt", "1.234,5\n9.876,5\n");
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "--locale",
            "eu",
            "--all",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("type      : number"))
        .stdout(predicate::str::contains("decimal   : ,"));
}

#[test]
fn formats_lists_the_builtin_masks() {
    Command::cargo_bin("type-probe")
        .expect("binary exists")
        .args(["formats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#,###.0;(#,###.0)"))
        .stdout(predicate::str::contains("%Y-%m-%d"));
}
