#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;

pub const WHEEL_NAME: &str = "lammps-2023.8.2-py3-none-any.whl";

/// Lays out a minimal LAMMPS python tree: `python/setup.py`, the
/// `python/lammps/` package sources, and a prebuilt shared library at the
/// root. Returns the tempdir guard and its canonical root path.
pub fn prepare_fixture(prefix: &str) -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let root = temp.path().canonicalize().expect("canonical root");
    let build_root = root.join("python");
    fs::create_dir_all(build_root.join("lammps")).expect("package dir");
    fs::write(
        build_root.join("setup.py"),
        "from setuptools import setup\nsetup()\n",
    )
    .expect("setup.py");
    fs::write(root.join("liblammps.so"), b"shared-object").expect("lib");
    (temp, root)
}

/// Writes a shell script that stands in for a real interpreter.
///
/// `-m venv DIR` copies the script into `DIR/bin/python` so the follow-up
/// build call works, `-m pip wheel` drops a wheel whose contents record the
/// `LAMMPS_SHARED_LIB` value, and `-m pip install` runs `install_script`.
#[cfg(unix)]
pub fn write_stub_python(dir: &std::path::Path, install_script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    mkdir -p "$3/bin"
    cp "$0" "$3/bin/python"
    exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ] && [ "$3" = "wheel" ]; then
    wheel_dir=""
    prev=""
    for arg in "$@"; do
        if [ "$prev" = "--wheel-dir" ]; then
            wheel_dir="$arg"
        fi
        prev="$arg"
    done
    printf 'library: %s\n' "$LAMMPS_SHARED_LIB" > "$wheel_dir/{wheel}"
    exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ] && [ "$3" = "install" ]; then
{install}
fi
exit 0
"#,
        wheel = WHEEL_NAME,
        install = install_script,
    );
    let path = dir.join("python-stub");
    fs::write(&path, script).expect("write stub");
    let mut perms = fs::metadata(&path).expect("stub metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("stub perms");
    path
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout_of(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}
