//! Scenario: `ttx compute` and `ttx explain`
//!
//! GREEN when:
//! - The Georgia reference return prints GA tax 4567.20 and a 432.80 refund.
//! - `--json` emits one document whose GA line amounts are integer cents.
//! - A part-year mover prints one state line per request, in request order.
//! - `explain --node ga500.tax` walks back to the federal AGI and wages.
//! - An unregistered state fails with "unsupported jurisdiction" on stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn ttx() -> Command {
    Command::cargo_bin("ttx").unwrap()
}

#[test]
fn georgia_reference_summary() {
    ttx()
        .args(["compute", &fixture("ga_single_100k.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("state=GA form=\"Form 500\""))
        .stdout(predicate::str::contains("taxable=88000.00"))
        .stdout(predicate::str::contains("tax_after_credits=4567.20"))
        .stdout(predicate::str::contains("=> Georgia refund = 432.80"))
        .stdout(predicate::str::contains("tables_hash="));
}

#[test]
fn json_output_carries_cents() {
    let out = ttx()
        .args(["compute", &fixture("ga_single_100k.json"), "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let ga = &doc["states"][0];
    assert_eq!(ga["state_code"], "GA");
    assert_eq!(ga["state_tax_before_credits"], 456_720);
    assert_eq!(ga["overpaid"], 43_280);
    assert_eq!(ga["result_line"]["kind"], "refund");
    assert_eq!(doc["federal"]["agi"], 10_000_000);
    assert_eq!(doc["tables_hash"].as_str().map(str::len), Some(64));
    assert!(doc["provenance"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["id"] == "ga500.tax"));
}

#[test]
fn show_zero_prints_more_nodes() {
    let shown = |extra: &[&str]| -> usize {
        let mut args = vec!["compute".to_string(), fixture("ga_single_100k.json"), "--json".to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        let out = ttx().args(&args).output().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        doc["provenance"].as_array().map(Vec::len).unwrap_or(0)
    };
    assert!(shown(&["--show-zero"]) > shown(&[]));
}

#[test]
fn mover_prints_states_in_request_order() {
    let out = ttx()
        .args(["compute", &fixture("ok_to_mo_mover.json")])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();

    let ok = stdout.find("state=OK").unwrap();
    let mo = stdout.find("state=MO").unwrap();
    assert!(ok < mo);
    assert!(stdout.contains("residency=part-year"));
    assert!(stdout.contains("ratio=151/365"));
    assert!(stdout.contains("ratio=214/365"));
}

#[test]
fn explain_walks_to_federal_inputs() {
    ttx()
        .args([
            "explain",
            &fixture("ga_single_100k.json"),
            "--node",
            "ga500.tax",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("f1040.wages = 100000.00"))
        .stdout(predicate::str::contains("f1040.agi"))
        .stdout(predicate::str::contains("ga500.tax = 4567.20"));
}

#[test]
fn explain_unknown_node_fails() {
    ttx()
        .args(["explain", &fixture("ga_single_100k.json"), "--node", "ga500.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot explain 'ga500.nope'"));
}

#[test]
fn unsupported_state_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tx.json");
    let raw = std::fs::read_to_string(fixture("ga_single_100k.json"))
        .unwrap()
        .replace("\"state_code\": \"GA\", \"residency_type\"", "\"state_code\": \"TX\", \"residency_type\"");
    std::fs::write(&path, raw).unwrap();

    ttx()
        .args(["compute", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported jurisdiction 'TX'"));
}
