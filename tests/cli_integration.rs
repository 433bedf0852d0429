//! Integration tests for the cardlog CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  Nothing
//! here talks to the card catalog: commands that need it (add, import,
//! trade, value) are covered by the library tests with an in-memory
//! catalog.  Passwords come from `CARDLOG_PASSWORD` so no prompt appears.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "correct-horse-battery";

/// Helper: get a Command pointing at the cardlog binary.
fn cardlog() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cardlog").expect("binary should exist");
    cmd.env_remove("CARDLOG_PASSWORD")
        .env_remove("CARDLOG_OTHER_PASSWORD")
        .env_remove("CARDLOG_HOME")
        .env_remove("CARDLOG_LOG");
    cmd
}

/// A config dir whose Argon2 settings keep each unlock fast.
fn config_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("config.toml")
        .write_str(
            "argon2_memory_kib = 8192\n\
             argon2_iterations = 1\n\
             argon2_parallelism = 1\n",
        )
        .unwrap();
    tmp
}

/// Command bound to `dir` with the collection password set.
fn in_dir(dir: &TempDir) -> Command {
    let mut cmd = cardlog();
    cmd.arg("--config-dir")
        .arg(dir.path())
        .env("CARDLOG_PASSWORD", PASSWORD);
    cmd
}

// ---------------------------------------------------------------------------
// Help and usage
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    cardlog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Encrypted trading-card collection tracker",
        ))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("trade"))
        .stdout(predicate::str::contains("logins"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn version_flag_shows_version() {
    cardlog()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cardlog"));
}

#[test]
fn no_args_shows_help() {
    cardlog()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_print_type_is_rejected_by_parser() {
    cardlog()
        .args(["add", "swsh1-1", "glossy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("glossy"));
}

#[test]
fn trade_requires_both_sides() {
    cardlog()
        .args(["trade", "--with", "misty", "--give", "swsh1-1:holofoil"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--take"));
}

#[test]
fn completions_bash_outputs_script() {
    cardlog()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cardlog"));
}

#[test]
fn completions_unknown_shell_fails() {
    cardlog().args(["completions", "csh"]).assert().failure();
}

// ---------------------------------------------------------------------------
// Collection lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_collection_file() {
    let dir = config_dir();

    in_dir(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Collection 'default' created"));

    dir.child("default.cardlog").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_password() {
    let dir = config_dir();

    cardlog()
        .arg("--config-dir")
        .arg(dir.path())
        .env("CARDLOG_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));

    dir.child("default.cardlog")
        .assert(predicate::path::missing());
}

#[test]
fn list_on_fresh_collection_is_empty() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No cards in this collection yet"));
}

#[test]
fn logins_grow_with_each_open() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();
    in_dir(&dir).arg("list").assert().success();

    // init, list, and this invocation.
    in_dir(&dir)
        .arg("logins")
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn wrong_password_fails_and_names_authentication() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    cardlog()
        .arg("--config-dir")
        .arg(dir.path())
        .env("CARDLOG_PASSWORD", "not-the-password")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn damaged_file_reports_corruption() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();
    dir.child("default.cardlog").write_binary(b"garbage").unwrap();

    in_dir(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn list_on_missing_collection_fails() {
    let dir = config_dir();

    in_dir(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Collection not found"));
}

#[test]
fn invalid_collection_name_fails() {
    let dir = config_dir();

    in_dir(&dir)
        .args(["-c", "../escape", "list"])
        .assert()
        .failure();
}

#[test]
fn named_collections_are_separate_files() {
    let dir = config_dir();
    in_dir(&dir).args(["-c", "misty", "init"]).assert().success();
    in_dir(&dir).args(["-c", "brock", "init"]).assert().success();

    dir.child("misty.cardlog").assert(predicate::path::exists());
    dir.child("brock.cardlog").assert(predicate::path::exists());

    in_dir(&dir)
        .arg("collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("misty"))
        .stdout(predicate::str::contains("brock"));
}

// ---------------------------------------------------------------------------
// Offline record commands
// ---------------------------------------------------------------------------

#[test]
fn remove_missing_record_fails() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args(["remove", "swsh1-1", "holofoil", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("swsh1-1"));
}

#[test]
fn show_reports_zero_for_unheld_card() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args(["show", "swsh1-1", "normal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0"));
}

#[test]
fn export_empty_collection_prints_header() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("card_id,print_type,qnty"));
}

#[test]
fn export_refuses_collection_extension() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args(["export", "-o"])
        .arg(dir.path().join("other.cardlog"))
        .assert()
        .failure();
}

#[test]
fn trade_with_self_is_rejected() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args([
            "trade",
            "--with",
            "default",
            "--give",
            "swsh1-1:holofoil",
            "--take",
            "base1-4:normal",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("itself"));
}

#[test]
fn delete_missing_record_fails_without_prompting() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args(["delete", "base1-4", "feh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base1-4"));
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[test]
fn audit_shows_init_for_active_collection_only() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();
    in_dir(&dir).args(["-c", "misty", "init"]).assert().success();

    in_dir(&dir)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 change(s) to 'default'"));

    in_dir(&dir)
        .args(["audit", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 change(s) to all collections"))
        .stdout(predicate::str::contains("misty"));
}

#[test]
fn audit_rejects_bad_since() {
    let dir = config_dir();
    in_dir(&dir).arg("init").assert().success();

    in_dir(&dir)
        .args(["audit", "--since", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration"));
}
