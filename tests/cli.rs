// CLI regression tests: run the `regress` binary against a scratch store.
// Requires: assert_cmd, predicates, tempfile crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn regress(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("regress").unwrap();
    cmd.env_remove("REGRESS_ROOT").arg("--root").arg(root);
    cmd
}

#[test]
fn list_shows_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("suite__a.json"), "{}\n").unwrap();
    fs::write(dir.path().join("suite__b.txt"), "").unwrap();

    regress(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(
            contains("suite__a.json")
                .and(contains("suite__b.txt"))
                .and(contains("e3b0c44298fc"))
                .and(contains("2 artifact(s)")),
        );
}

#[test]
fn list_of_missing_store_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    regress(&dir.path().join("nothing"))
        .arg("list")
        .assert()
        .success()
        .stdout(contains("0 artifact(s)"));
}

#[test]
fn show_prints_contents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("k.txt"), "canonical text\n").unwrap();

    regress(dir.path())
        .args(["show", "k.txt"])
        .assert()
        .success()
        .stdout("canonical text\n");
}

#[test]
fn show_missing_key_fails_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    regress(dir.path())
        .args(["show", "absent.json"])
        .assert()
        .failure()
        .stderr(contains("regress::missing").or(contains("absent.json")));
}

#[test]
fn show_rejects_path_keys() {
    let dir = tempfile::tempdir().unwrap();
    regress(dir.path())
        .args(["show", "../escape"])
        .assert()
        .failure()
        .stderr(contains("regress::invalid_key").or(contains("path separator")));
}

#[test]
fn remove_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.json"), "1").unwrap();
    fs::write(dir.path().join("b.json"), "2").unwrap();
    fs::write(dir.path().join("c.json"), "3").unwrap();

    regress(dir.path())
        .args(["remove", "a.json", "zzz.json"])
        .assert()
        .success()
        .stdout(contains("removed 1 artifact(s)"))
        .stderr(contains("zzz.json"));
    assert!(!dir.path().join("a.json").exists());

    regress(dir.path())
        .arg("clear")
        .assert()
        .success()
        .stdout(contains("cleared 2 artifact(s)"));
    assert!(dir.path().is_dir());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
