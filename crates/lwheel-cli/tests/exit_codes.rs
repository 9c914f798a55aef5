use assert_cmd::cargo::cargo_bin_cmd;

mod common;

use common::{parse_json, prepare_fixture, stdout_of};

#[test]
fn missing_required_arguments_exit_with_usage_error() {
    cargo_bin_cmd!("lwheel").assert().code(2);
}

#[test]
fn nonexistent_package_exits_one_with_an_explanation() {
    let (_temp, root) = prepare_fixture("lwheel-exit-");
    let assert = cargo_bin_cmd!("lwheel")
        .current_dir(&root)
        .args([
            "--noinstall",
            "--package",
            "missing",
            "--lib",
            "liblammps.so",
        ])
        .assert()
        .code(1);
    let stdout = stdout_of(&assert);
    assert!(
        stdout.contains("LAMMPS package") && stdout.contains("does not exist"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("Hint:"), "stdout: {stdout}");
}

#[test]
fn nonexistent_wheeldir_exits_one() {
    let (_temp, root) = prepare_fixture("lwheel-exit-");
    let assert = cargo_bin_cmd!("lwheel")
        .current_dir(&root)
        .args([
            "--noinstall",
            "--package",
            "python/lammps",
            "--lib",
            "liblammps.so",
            "--wheeldir",
            "no-such-dir",
        ])
        .assert()
        .code(1);
    let stdout = stdout_of(&assert);
    assert!(
        stdout.contains("to store the wheel does not exist"),
        "stdout: {stdout}"
    );
}

#[test]
fn json_envelope_reports_a_user_error() {
    let (_temp, root) = prepare_fixture("lwheel-json-");
    let assert = cargo_bin_cmd!("lwheel")
        .current_dir(&root)
        .args(["--json", "--package", "missing", "--lib", "liblammps.so"])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert!(
        payload["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("lwheel install:")),
        "payload: {payload}"
    );
    assert_eq!(payload["details"]["reason"], "missing_package");
}

#[test]
fn quiet_suppresses_human_output() {
    let (_temp, root) = prepare_fixture("lwheel-quiet-");
    let assert = cargo_bin_cmd!("lwheel")
        .current_dir(&root)
        .args([
            "--quiet",
            "--package",
            "missing",
            "--lib",
            "liblammps.so",
        ])
        .assert()
        .code(1);
    assert!(assert.get_output().stdout.is_empty());
}
