//! End-to-end tests for the `lockbox` binary
//!
//! Stdin is a pipe here, so passwords are read as plain lines.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Cheap Argon2 parameters, no key file, password "hunter2"
const FIRST_RUN: &str = "1\n1024\n1\nn\nhunter2\nhunter2\n";

fn lockbox(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lockbox").unwrap();
    cmd.env("LOCKBOX_HOME", home.path())
        .env_remove("LOCKBOX_CONFIG")
        .env_remove("LOCKBOX_LOG");
    cmd
}

fn set_up(home: &TempDir) {
    lockbox(home)
        .arg("login")
        .write_stdin(FIRST_RUN)
        .assert()
        .success()
        .stdout(predicate::str::contains("Master password set up."));
}

#[test]
fn first_run_writes_config_and_database() {
    let home = TempDir::new().unwrap();
    set_up(&home);

    let config = std::fs::read_to_string(home.path().join("config.yaml")).unwrap();
    assert!(config.contains("memory: 1024"));
    assert!(config.contains("iterations: 1"));
    assert!(config.contains("threads: 1"));
    assert!(!config.contains("hunter2"));

    assert!(home.path().join("data").join("lockbox.db").exists());
}

#[test]
fn login_with_correct_password() {
    let home = TempDir::new().unwrap();
    set_up(&home);

    lockbox(&home)
        .arg("login")
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Authenticated."));
}

#[test]
fn login_with_wrong_password_fails() {
    let home = TempDir::new().unwrap();
    set_up(&home);
    let before = std::fs::read_to_string(home.path().join("config.yaml")).unwrap();

    lockbox(&home)
        .arg("login")
        .write_stdin("hunter3\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));

    let after = std::fs::read_to_string(home.path().join("config.yaml")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn password_mismatch_on_first_run() {
    let home = TempDir::new().unwrap();

    lockbox(&home)
        .arg("login")
        .write_stdin("1\n1024\n1\nn\nhunter2\nhunter3\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passwords do not match"));

    assert!(!home.path().join("config.yaml").exists());
}

#[test]
fn invalid_parameter_on_first_run() {
    let home = TempDir::new().unwrap();

    lockbox(&home)
        .arg("login")
        .write_stdin("many\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid iterations"));
}

#[test]
fn config_runs_without_authentication() {
    let home = TempDir::new().unwrap();

    lockbox(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("not set up"));

    set_up(&home);

    lockbox(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Memory:     1024 KiB"))
        .stdout(predicate::str::contains("Key file: disabled"));
}

#[test]
fn setup_changes_password() {
    let home = TempDir::new().unwrap();
    set_up(&home);

    lockbox(&home)
        .arg("setup")
        .write_stdin("hunter2\n1\n2048\n1\nn\nswordfish\nswordfish\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Master password changed."));

    lockbox(&home)
        .arg("login")
        .write_stdin("hunter2\n")
        .assert()
        .failure();

    lockbox(&home)
        .arg("login")
        .write_stdin("swordfish\n")
        .assert()
        .success();
}

#[test]
fn keyfile_can_be_enabled() {
    let home = TempDir::new().unwrap();
    set_up(&home);

    let keyfile = home.path().join("lockbox.key");
    std::fs::write(&keyfile, [42u8; 32]).unwrap();
    let keyfile = keyfile.to_str().unwrap().to_string();

    lockbox(&home)
        .arg("keyfile")
        .write_stdin(format!("hunter2\ny\nn\n{}\n", keyfile))
        .assert()
        .success()
        .stdout(predicate::str::contains("Key file enabled"));

    lockbox(&home)
        .arg("login")
        .write_stdin(format!("hunter2\n{}\n", keyfile))
        .assert()
        .success();

    lockbox(&home)
        .arg("login")
        .write_stdin("hunter2\n\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn explicit_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("elsewhere.yml");

    lockbox(&home)
        .arg("--config")
        .arg(&config)
        .arg("login")
        .write_stdin(FIRST_RUN)
        .assert()
        .success();

    assert!(config.exists());
    assert!(!home.path().join("config.yaml").exists());
}

#[test]
fn missing_database_gives_recovery_advice() {
    let home = TempDir::new().unwrap();
    set_up(&home);
    std::fs::remove_file(home.path().join("data").join("lockbox.db")).unwrap();

    for command in ["login", "setup"] {
        lockbox(&home)
            .arg(command)
            .write_stdin("hunter2\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("restore the database file"))
            .stderr(predicate::str::contains("lockbox setup").not());
    }
}
