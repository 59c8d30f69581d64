mod common;

use std::fs;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::prelude::*;
use predicates::str::contains;

fn databridge() -> Command {
    Command::cargo_bin("databridge").expect("binary exists")
}

#[test]
fn convert_csv_file_to_json_on_stdout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", "Name,Age\nAda,36\nLin,29\n");
    let output = databridge()
        .args(["convert", "-i", input.to_str().unwrap()])
        .output()
        .expect("run convert");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(
        value,
        serde_json::json!([{"age": 36, "name": "Ada"}, {"age": 29, "name": "Lin"}])
    );
}

#[test]
fn convert_reads_stdin_and_writes_a_file() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("out.json");
    databridge()
        .args([
            "convert",
            "-i",
            "-",
            "-o",
            output.to_str().unwrap(),
            "--format",
            "pretty",
        ])
        .write_stdin("First-Name=Ada&address.city=Lyon")
        .assert()
        .success();
    let contents = fs::read_to_string(&output).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
    assert_eq!(
        value,
        serde_json::json!({"firstname": "Ada", "address": {"city": "Lyon"}})
    );
    assert!(contents.contains('\n'));
}

#[test]
fn convert_keeps_keys_when_normalization_is_off() {
    databridge()
        .args(["convert", "-i", "-", "--no-normalize"])
        .write_stdin(r#"{"First-Name": "Ada"}"#)
        .assert()
        .success()
        .stdout(contains(r#"{"First-Name":"Ada"}"#));
}

#[test]
fn convert_yaml_input_to_yaml_output() {
    databridge()
        .args(["convert", "-i", "-", "--yaml", "--format", "yaml"])
        .write_stdin("Name: Ada\nTags:\n  - a\n  - b\n")
        .assert()
        .success()
        .stdout(contains("name: Ada").and(contains("- a")));
}

#[test]
fn convert_without_number_conversion_keeps_text() {
    databridge()
        .args(["convert", "-i", "-", "--no-number-conversion"])
        .write_stdin("age=30")
        .assert()
        .success()
        .stdout(contains(r#"{"age":"30"}"#));
}

#[test]
fn detect_reports_format_and_rows() {
    databridge()
        .args(["detect", "-i", "-"])
        .write_stdin("a,b\n1,2\n3,4\n")
        .assert()
        .success()
        .stdout("csv\t2\n");

    databridge()
        .args(["detect", "-i", "-", "--yaml"])
        .write_stdin("a: 1\n")
        .assert()
        .success()
        .stdout("yaml\t1\n");
}

#[test]
fn missing_input_file_fails_with_context() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.json");
    databridge()
        .args(["convert", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("Opening input file")));
}
