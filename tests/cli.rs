use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_doc(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn evomark(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("evomark");
    cmd.current_dir(dir);
    cmd
}

#[test]
fn parse_prints_tree() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "Hello #box{world}");

    evomark(dir.path())
        .arg("parse")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("func box").and(predicate::str::contains("text world")));
}

#[test]
fn parse_fails_on_unparseable_input() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "text # more");

    evomark(dir.path())
        .arg("parse")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing stopped"));
}

#[test]
fn fmt_check_accepts_canonical_file() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "%x = $t{a}\n");

    evomark(dir.path()).arg("fmt").arg(&doc).arg("--check").assert().success();
}

#[test]
fn fmt_check_rejects_messy_file() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "%x   =   $t{a}\n");

    evomark(dir.path())
        .arg("fmt")
        .arg(&doc)
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not formatted"));

    evomark(dir.path())
        .arg("fmt")
        .arg(&doc)
        .assert()
        .success()
        .stdout("%x = $t{a}\n");
}

#[test]
fn fmt_honors_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "#box{\nx\n}");
    let config = write_doc(&dir, "custom.toml", "[formatting]\nindent_string = \"    \"\n");

    evomark(dir.path())
        .arg("fmt")
        .arg(&doc)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("#box{\n    x\n}\n");
}

#[test]
fn exec_persists_state_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let first = write_doc(&dir, "first.evo", "%name = $init{Ada}\nHello %name");

    evomark(dir.path())
        .arg("exec")
        .arg(&first)
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("literal Ada"));
    assert!(state.exists());

    let second = write_doc(&dir, "second.evo", "%name = $init{Grace}\nHello %name");
    evomark(dir.path())
        .arg("exec")
        .arg(&second)
        .arg("--state")
        .arg(&state)
        .arg("--format")
        .arg("source")
        .assert()
        .success()
        .stdout(predicate::str::contains("$init{Grace}"));

    let saved = fs::read_to_string(&state).unwrap();
    assert!(saved.contains("\"Ada\""));
}

#[test]
fn exec_no_persist_leaves_no_state() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "%x = $init{v}");

    evomark(dir.path()).arg("exec").arg(&doc).arg("--no-persist").assert().success();
    assert!(!dir.path().join(".evomark-state.json").exists());
}

#[test]
fn exec_reports_halt() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "$require{%missing}");

    evomark(dir.path())
        .arg("exec")
        .arg(&doc)
        .arg("--no-persist")
        .assert()
        .success()
        .stderr(predicate::str::contains("Execution halted"))
        .stdout(predicate::str::contains("cmd halted_here"));
}

#[test]
fn exec_fails_on_undefined_variable() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(&dir, "doc.evo", "%nope");

    evomark(dir.path())
        .arg("exec")
        .arg(&doc)
        .arg("--no-persist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Undefined variable %nope"));
}

#[test]
fn list_rules_shows_builtins() {
    let dir = tempfile::tempdir().unwrap();
    evomark(dir.path())
        .arg("list-rules")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("#box")
                .and(predicate::str::contains("#config"))
                .and(predicate::str::contains("$init")),
        );
}
