use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn roster(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("roster").expect("roster binary");
    cmd.env_remove("ROSTER_DB_PATH")
        .env_remove("ROSTER_LOG_DIR")
        .env("ROSTER_USER", "admin")
        .env("ROSTER_PASSWORD", "password")
        .arg("--db")
        .arg(db);
    cmd
}

#[test]
fn create_then_list_prints_envelopes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");

    roster(&db)
        .args(["create", "john", "THIRD_GRADE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": 201"))
        .stdout(predicate::str::contains("\"username\": \"john\""));

    roster(&db)
        .args(["list", "--term", "jo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 1"));
}

#[test]
fn wrong_password_exits_with_failure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");

    roster(&db)
        .env("ROSTER_PASSWORD", "guess")
        .args(["list"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": 401"));
}

#[test]
fn unknown_level_is_rejected_by_argument_parsing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");

    roster(&db)
        .args(["create", "john", "SIXTH_GRADE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SIXTH_GRADE"));
}

#[test]
fn missing_student_reports_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");

    roster(&db)
        .args(["get", "42"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": 404"));
}

#[test]
fn export_file_can_be_imported_into_another_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");
    let csv = dir.path().join("students.csv");

    roster(&source)
        .args(["create", "mike", "ADVANCED"])
        .assert()
        .success();
    roster(&source)
        .args(["create", "jones", "FIRST_GRADE"])
        .assert()
        .success();
    roster(&source)
        .arg("export")
        .arg("--out")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exported\": 2"));

    let exported = std::fs::read_to_string(&csv).expect("read export");
    assert!(exported.starts_with("ID,Username,Level\n"));

    roster(&target)
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"imported\": 2"));

    roster(&target)
        .args(["list", "--level", "ADVANCED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"username\": \"mike\""));
}

#[test]
fn export_without_out_streams_csv_to_stdout() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");

    roster(&db)
        .args(["create", "mojo", "INTERMEDIATE"])
        .assert()
        .success();
    roster(&db)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID,Username,Level\n"))
        .stderr(predicate::str::contains("\"exported\": 1"));
}
