// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_local_config(dir: &Path) {
    fs::write(
        dir.join(".paperdexrc.toml"),
        r#"
[embeddings]
provider = "local"
dimensions = 64

[chunking]
max_chars = 40
"#,
    )
    .unwrap();
}

fn paperdex(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("paperdex"));
    cmd.current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PAPERDEX_PROVIDER")
        .env_remove("PAPERDEX_DIMENSIONS")
        .env_remove("PAPERDEX_MODEL")
        .env("NO_COLOR", "1");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn ingest_then_query_json() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    let report = json_stdout(paperdex(dir.path()).args([
        "--format",
        "json",
        "ingest",
        "-w",
        "lab",
        "-i",
        "note-1",
        "Fusion research.\n\nThis paragraph is exactly sixty-two characters long for a boundary test.",
    ]));
    assert_eq!(report["created"], 3);
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
    assert!(dir.path().join(".paperdex").join("embeddings.sqlite").exists());

    let results = json_stdout(paperdex(dir.path()).args([
        "--format", "json", "query", "fusion", "-w", "lab", "-m", "2",
    ]));
    let results = results.as_array().unwrap();
    assert!(!results.is_empty() && results.len() <= 2);
    assert_eq!(results[0]["item_id"], "note-1");
    assert_eq!(results[0]["text"], "Fusion research.");
}

#[test]
fn query_other_workspace_returns_nothing() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    paperdex(dir.path())
        .args(["ingest", "-w", "alpha", "-i", "doc", "stellarator design notes"])
        .assert()
        .success();

    paperdex(dir.path())
        .args(["query", "stellarator", "-w", "beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches."));
}

#[test]
fn ingest_from_file_and_stats() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());
    let doc = dir.path().join("draft.md");
    fs::write(&doc, "Abstract line\n\nIntroduction line\n").unwrap();

    paperdex(dir.path())
        .args(["ingest", "-w", "ws", "-i", "draft", "--file"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 chunks"));

    let stats = json_stdout(paperdex(dir.path()).args(["--format", "json", "stats", "-w", "ws"]));
    assert_eq!(stats["records"], 2);
    assert_eq!(stats["items"][0]["model"], "local-hash-64");
}

#[test]
fn reembed_then_delete_item() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    for command in ["ingest", "reembed"] {
        paperdex(dir.path())
            .args([command, "-w", "ws", "-i", "doc", "some text"])
            .assert()
            .success();
    }

    let deleted = json_stdout(paperdex(dir.path()).args([
        "--format", "json", "delete", "-w", "ws", "-i", "doc",
    ]));
    assert_eq!(deleted["deleted"], 2);
}

#[test]
fn ingest_reads_stdin() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    paperdex(dir.path())
        .args(["ingest", "-w", "ws", "-i", "piped"])
        .write_stdin("piped paragraph\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 chunks"));
}

#[test]
fn forced_remote_without_key_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".paperdexrc.toml"),
        "[embeddings]\nprovider = \"remote\"\n",
    )
    .unwrap();

    paperdex(dir.path())
        .args(["query", "anything", "-w", "ws"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"));
}

#[test]
fn provider_reports_local_fallback() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    let provider = json_stdout(paperdex(dir.path()).args(["--format", "json", "provider"]));
    assert_eq!(provider["provider"], "local");
    assert_eq!(provider["model"], "local-hash-64");
    assert_eq!(provider["dimensions"], 64);
    assert!(provider["endpoint"].is_null());
}

#[test]
fn query_rejects_nan_threshold() {
    let dir = TempDir::new().unwrap();
    write_local_config(dir.path());

    paperdex(dir.path())
        .args(["query", "fusion", "-w", "ws", "-t", "nan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside [-1, 1]"));
}
