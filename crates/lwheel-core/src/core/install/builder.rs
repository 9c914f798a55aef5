use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;

use crate::context::CommandContext;
use crate::outcome::{InstallFailure, InstallUserError};
use crate::wheel::{find_project_wheels, wheel_file_name};

use super::path_arg;

/// Name of the variable `setup.py` reads to decide which shared library to
/// bundle into the wheel.
pub(crate) const SHARED_LIB_ENV: &str = "LAMMPS_SHARED_LIB";

/// Runs `pip wheel` inside the build environment and returns the produced
/// wheel.
pub(crate) fn build_wheel(
    ctx: &CommandContext<'_>,
    env_python: &Path,
    build_root: &Path,
    lib_name: &str,
) -> Result<PathBuf> {
    let root_arg = path_arg(build_root)?;
    let args = vec![
        "-m".to_string(),
        "pip".to_string(),
        "wheel".to_string(),
        "--no-deps".to_string(),
        "--wheel-dir".to_string(),
        root_arg.clone(),
        root_arg,
    ];
    let envs = vec![(SHARED_LIB_ENV.to_string(), lib_name.to_string())];
    tracing::debug!(python = %env_python.display(), lib = lib_name, "building wheel");
    let output = ctx
        .python_runtime()
        .run_command(&path_arg(env_python)?, &args, &envs, build_root)?;
    if output.code != 0 {
        return Err(InstallFailure::new(
            "wheel build failed",
            json!({
                "exit_code": output.code,
                "output": output.combined(),
            }),
        )
        .into());
    }

    let mut wheels = find_project_wheels(build_root)?;
    match wheels.len() {
        0 => Err(InstallUserError::new(
            "build completed but produced no wheel",
            json!({
                "build_root": build_root.display().to_string(),
                "hint": "Check that --package points at the setup.py of the LAMMPS python package.",
            }),
        )
        .into()),
        1 => Ok(wheels.remove(0)),
        _ => {
            let names: Vec<String> = wheels.iter().map(|p| wheel_file_name(p)).collect();
            Err(InstallFailure::new(
                "build produced more than one wheel",
                json!({
                    "build_root": build_root.display().to_string(),
                    "wheels": names,
                }),
            )
            .into())
        }
    }
}
