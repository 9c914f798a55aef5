use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use which::which;

/// Locates the interpreter used to bootstrap the build environment.
///
/// `LWHEEL_PYTHON` wins over `PATH` discovery so CI and tests can pin an
/// interpreter.
///
/// # Errors
///
/// Returns an error when no interpreter can be found or its path is not valid
/// UTF-8.
pub fn detect_interpreter() -> Result<String> {
    if let Ok(explicit) = std::env::var("LWHEEL_PYTHON") {
        return Ok(explicit);
    }
    for candidate in ["python3", "python"] {
        if let Ok(path) = which(candidate) {
            return path
                .into_os_string()
                .into_string()
                .map_err(|_| anyhow!("non-utf8 path"));
        }
    }
    bail!("no python interpreter found on PATH; set LWHEEL_PYTHON")
}

/// Interpreter path inside a virtual environment root.
pub(crate) fn venv_python(env_root: &Path) -> PathBuf {
    if cfg!(windows) {
        env_root.join("Scripts").join("python.exe")
    } else {
        env_root.join("bin").join("python")
    }
}
