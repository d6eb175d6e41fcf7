//! End-to-end tests of the `disclose` binary in deterministic mode.

use disclose_testkit::TestFixture;
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

const ROOT_HEX: &str = "81952b5c47f0703b5f2543a6dde2be50c5271e327c438e85c70874adf5b10e12";

fn disclose(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_disclose"))
        .args(args)
        .env("DISCLOSE_OTS_MOCK", "1")
        .env_remove("DISCLOSE_OTS_HELPER")
        .env_remove("DISCLOSE_CALENDARS")
        .output()
        .expect("run disclose binary")
}

fn json_line(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim().lines().count(), 1, "stdout: {stdout}");
    serde_json::from_str(stdout.trim()).expect("stdout is JSON")
}

fn stamp(receipt: &Path) -> Output {
    disclose(&[
        "stamp",
        "--digest",
        ROOT_HEX,
        "--out",
        receipt.to_str().unwrap(),
    ])
}

#[test]
fn test_stamp_then_verify() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("receipts").join("bundle-root.ots");

    let output = stamp(&receipt);
    assert!(output.status.success());
    let line = json_line(&output);
    assert_eq!(line["ok"], true);
    assert_eq!(line["action"], "stamp");
    assert!(receipt.exists());

    let output = disclose(&[
        "verify",
        "--receipt",
        receipt.to_str().unwrap(),
        "--digest",
        ROOT_HEX,
    ]);
    assert!(output.status.success());
    assert_eq!(json_line(&output)["result"]["verified"], true);
}

#[test]
fn test_verify_other_digest_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("bundle-root.ots");
    assert!(stamp(&receipt).status.success());

    let other = "00".repeat(32);
    let output = disclose(&[
        "verify",
        "--receipt",
        receipt.to_str().unwrap(),
        "--digest",
        &other,
        "--timeout",
        "5000",
    ]);
    assert_eq!(output.status.code(), Some(3));
    let line = json_line(&output);
    assert_eq!(line["ok"], false);
    assert_eq!(line["result"]["verified"], false);
}

#[test]
fn test_upgrade_and_info() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("bundle-root.ots");
    assert!(stamp(&receipt).status.success());
    let before = std::fs::read(&receipt).unwrap();

    let output = disclose(&["upgrade", "--receipt", receipt.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(json_line(&output)["result"]["changed"], false);
    assert_eq!(std::fs::read(&receipt).unwrap(), before);

    let output = disclose(&["info", "--receipt", receipt.to_str().unwrap()]);
    assert!(output.status.success());
    let info = json_line(&output)["result"]["info"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(info.contains(ROOT_HEX));
}

#[test]
fn test_missing_receipt_is_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.ots");
    let output = disclose(&["info", "--receipt", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    let line = json_line(&output);
    assert_eq!(line["ok"], false);
    assert!(line["error"].as_str().unwrap().contains("reading receipt"));
}

#[test]
fn test_bad_digest_is_generic_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = disclose(&[
        "stamp",
        "--digest",
        "not-hex",
        "--out",
        dir.path().join("r.ots").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json_line(&output)["ok"], false);
}

#[test]
fn test_digest_file() {
    let fixture = TestFixture::new();
    let path = fixture.write_proof("empty.txt", b"");
    let output = disclose(&["digest", "--file", path.to_str().unwrap()]);
    assert!(output.status.success());
    let line = json_line(&output);
    assert_eq!(
        line["result"]["sha256"],
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(line["result"]["size_bytes"], 0);
}

#[test]
fn test_hash_manifest_writes_artifact() {
    let fixture = TestFixture::new();
    fixture.write_proof("outline.md", b"# Outline\n");
    let draft = fixture.draft_with_files(&["outline.md"]);
    let manifest = fixture.write_draft(&draft);

    let output = disclose(&["hash", "--manifest", manifest.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    let line = json_line(&output);
    let root = line["result"]["bundle_root_sha256"].as_str().unwrap();

    let hashes: Value =
        serde_json::from_slice(&std::fs::read(fixture.path().join("hashes.json")).unwrap())
            .unwrap();
    assert_eq!(hashes["algo"], "sha256+merkle/v1");
    assert_eq!(hashes["bundle_root_sha256"], root);

    let stored: Value = serde_json::from_slice(&std::fs::read(&manifest).unwrap()).unwrap();
    assert_eq!(stored["proof"]["bundle_root_sha256"], root);
}

#[test]
fn test_hash_manifest_with_missing_proof_fails() {
    let fixture = TestFixture::new();
    let draft = fixture.draft_with_files(&["missing.md"]);
    let manifest = fixture.write_draft(&draft);

    let output = disclose(&["hash", "--manifest", manifest.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(json_line(&output)["error"]
        .as_str()
        .unwrap()
        .contains("incomplete proof set"));
    assert!(!fixture.path().join("hashes.json").exists());
}

fn timestamps_block(manifest: &Path) -> Value {
    let stored: Value = serde_json::from_slice(&std::fs::read(manifest).unwrap()).unwrap();
    stored["timestamps"]["opentimestamps"].clone()
}

#[test]
fn test_manifest_stamp_upgrade_verify() {
    let fixture = TestFixture::new();
    fixture.write_proof("outline.md", b"# Outline\n");
    let draft = fixture.draft_with_files(&["outline.md"]);
    let manifest = fixture.write_draft(&draft);
    let manifest_arg = manifest.to_str().unwrap();
    assert!(disclose(&["hash", "--manifest", manifest_arg]).status.success());

    let output = disclose(&["stamp", "--manifest", manifest_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    let line = json_line(&output);
    assert_eq!(line["result"]["status"], "pending");

    let receipt = fixture.path().join("receipts").join("bundle-root.ots");
    let receipt_sha256 = disclose::Sha256Digest::hash(&std::fs::read(&receipt).unwrap()).to_hex();
    assert_eq!(line["result"]["receipt_sha256"], receipt_sha256.as_str());

    let block = timestamps_block(&manifest);
    assert_eq!(block["enabled"], true);
    assert_eq!(block["status"], "pending");
    assert_eq!(block["receipt_sha256"], receipt_sha256.as_str());
    assert_eq!(block["receipt_filename"], "bundle-root.ots");

    let output = disclose(&["upgrade", "--manifest", manifest_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert_eq!(json_line(&output)["result"]["status"], "complete");
    let block = timestamps_block(&manifest);
    assert_eq!(block["status"], "complete");
    assert_eq!(block["receipt_sha256"], receipt_sha256.as_str());

    let output = disclose(&["verify", "--manifest", manifest_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    let line = json_line(&output);
    assert_eq!(line["result"]["verified"], true);
    assert_eq!(line["result"]["outcome"], "verified");
}

#[test]
fn test_manifest_verify_after_edit_exits_3() {
    let fixture = TestFixture::new();
    fixture.write_proof("notes.txt", b"v1");
    let draft = fixture.draft_with_files(&["notes.txt"]);
    let manifest = fixture.write_draft(&draft);
    let manifest_arg = manifest.to_str().unwrap();
    assert!(disclose(&["hash", "--manifest", manifest_arg]).status.success());
    assert!(disclose(&["stamp", "--manifest", manifest_arg]).status.success());

    let mut stored: Value = serde_json::from_slice(&std::fs::read(&manifest).unwrap()).unwrap();
    stored["project"]["title"] = Value::from("Edited after stamping");
    std::fs::write(&manifest, serde_json::to_string_pretty(&stored).unwrap()).unwrap();

    let output = disclose(&["verify", "--manifest", manifest_arg]);
    assert_eq!(output.status.code(), Some(3));
    let line = json_line(&output);
    assert_eq!(line["ok"], false);
    assert_eq!(line["result"]["outcome"], "digest_mismatch");
}

#[test]
fn test_manifest_stamp_custom_out_is_recorded() {
    let fixture = TestFixture::new();
    fixture.write_proof("a.md", b"alpha");
    let draft = fixture.draft_with_files(&["a.md"]);
    let manifest = fixture.write_draft(&draft);
    let manifest_arg = manifest.to_str().unwrap();
    assert!(disclose(&["hash", "--manifest", manifest_arg]).status.success());

    let output = disclose(&["stamp", "--manifest", manifest_arg, "--out", "anchors/essay.ots"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert!(fixture.path().join("anchors").join("essay.ots").exists());
    assert_eq!(timestamps_block(&manifest)["receipt_filename"], "essay.ots");

    // a custom location has to be named again later
    let output = disclose(&["upgrade", "--manifest", manifest_arg]);
    assert_eq!(output.status.code(), Some(5));
    let output = disclose(&[
        "upgrade",
        "--manifest",
        manifest_arg,
        "--receipt",
        "anchors/essay.ots",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
}
