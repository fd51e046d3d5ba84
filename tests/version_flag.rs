use std::process::Command;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_reelix");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run reelix --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    let exe = env!("CARGO_BIN_EXE_reelix");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run reelix --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("Reelix"));
    assert!(stdout.contains("--version"));
    assert!(stdout.contains("--export-csv"));
}

#[test]
fn help_mentions_export_flags() {
    let mut cmd = assert_cmd::Command::cargo_bin("reelix").expect("find reelix binary");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("--export-report"));
}

#[test]
fn exports_csv_headlessly() {
    let exe = env!("CARGO_BIN_EXE_reelix");
    let dir = tempfile::tempdir().expect("create temp dir");
    let csv_path = dir.path().join("out.csv");
    let state_path = dir.path().join("state.db");

    let output = Command::new(exe)
        .arg("--export-csv")
        .arg(&csv_path)
        .env("REELIX_STORAGE__PATH", &state_path)
        .output()
        .expect("run reelix --export-csv");
    assert!(output.status.success());

    let contents = std::fs::read_to_string(&csv_path).expect("read exported csv");
    let header = contents.lines().next().expect("csv header");
    assert!(header.starts_with("Title,Type,Status"));
}
