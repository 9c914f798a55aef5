//! The build-and-install pipeline for the LAMMPS python wheel.
//!
//! One run stages the compiled shared library next to the python sources,
//! builds a binary wheel inside a throwaway virtual environment, and then
//! either stores the wheel or hands it to pip for installation.

mod buildenv;
mod builder;
mod pip;
mod stage;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::config::GlobalOptions;
use crate::context::CommandContext;
use crate::effects::{SharedRuntime, SystemPythonRuntime};
use crate::outcome::{ExecutionOutcome, InstallFailure, InstallUserError};
use crate::progress::ProgressReporter;
use crate::wheel::{parse_name_version, relocate_wheel, wheel_file_name};

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub package: PathBuf,
    pub lib: PathBuf,
    pub noinstall: bool,
    pub wheeldir: Option<PathBuf>,
}

/// Entry point used by the CLI binary.
///
/// # Errors
/// Returns an error when execution fails outside the normal outcome taxonomy,
/// for example when the working directory cannot be resolved.
pub fn execute(global: &GlobalOptions, request: &InstallRequest) -> Result<ExecutionOutcome> {
    let runtime: SharedRuntime = Arc::new(SystemPythonRuntime);
    let ctx = CommandContext::new(global, runtime)?;
    run_install(&ctx, request)
}

/// Builds the wheel and, unless `noinstall` is set, installs it with pip.
///
/// Expected problems surface as user-error or failure outcomes rather than
/// errors.
///
/// # Errors
/// Returns an error only for unexpected failures such as I/O problems outside
/// the pipeline steps.
pub fn run_install(
    ctx: &CommandContext<'_>,
    request: &InstallRequest,
) -> Result<ExecutionOutcome> {
    match run_install_inner(ctx, request) {
        Ok(outcome) => Ok(outcome),
        Err(err) => outcome_from_error(err),
    }
}

fn outcome_from_error(err: anyhow::Error) -> Result<ExecutionOutcome> {
    let err = match err.downcast::<InstallUserError>() {
        Ok(user) => return Ok(ExecutionOutcome::user_error(user.message, user.details)),
        Err(other) => other,
    };
    match err.downcast::<InstallFailure>() {
        Ok(failure) => Ok(ExecutionOutcome::failure(failure.message, failure.details)),
        Err(other) => Err(other),
    }
}

fn run_install_inner(
    ctx: &CommandContext<'_>,
    request: &InstallRequest,
) -> Result<ExecutionOutcome> {
    let plan = validate_request(request)?;
    tracing::debug!(build_root = %plan.build_root.display(), "resolved build root");

    let purged = stage::purge_stale_wheels(&plan.build_root)?;
    if purged > 0 {
        tracing::info!(count = purged, "purged stale wheels");
    }

    let bootstrap_python = match ctx.python_runtime().detect_interpreter() {
        Ok(python) => python,
        Err(err) => {
            return Err(InstallUserError::new(
                err.to_string(),
                json!({
                    "reason": "missing_interpreter",
                    "hint": "Install Python 3 or point LWHEEL_PYTHON at an interpreter.",
                }),
            )
            .into());
        }
    };

    let staged = stage::StagedLibrary::create(&plan.package_dir(), &plan.lib, &plan.lib_name)?;
    let built = build_phase(ctx, &plan, &bootstrap_python);
    drop(staged);
    stage::remove_build_residue(&plan.build_root);
    let wheel = built?;

    if plan.noinstall {
        let dest_dir = plan
            .wheeldir
            .clone()
            .unwrap_or_else(|| plan.build_root.clone());
        let final_path = relocate_wheel(&wheel, &dest_dir)?;
        let parsed = parse_name_version(&final_path);
        return Ok(ExecutionOutcome::success(
            format!("wrote {}", wheel_file_name(&final_path)),
            json!({
                "wheel": final_path.display().to_string(),
                "distribution": parsed.as_ref().map(|(name, _)| name.clone()),
                "version": parsed.as_ref().map(|(_, version)| version.clone()),
            }),
        ));
    }

    let progress = ProgressReporter::spinner("Installing wheel");
    let target = pip::install_wheel(ctx, &bootstrap_python, &wheel, &plan.build_root)?;
    progress.finish(format!("installed into {}", target.describe()));

    let dest_dir = plan
        .wheeldir
        .clone()
        .unwrap_or_else(|| ctx.invoked_from().to_path_buf());
    let final_path = relocate_wheel(&wheel, &dest_dir)?;
    let parsed = parse_name_version(&final_path);
    Ok(ExecutionOutcome::success(
        format!(
            "installed {} into {}",
            wheel_file_name(&final_path),
            target.describe()
        ),
        json!({
            "wheel": final_path.display().to_string(),
            "distribution": parsed.as_ref().map(|(name, _)| name.clone()),
            "version": parsed.as_ref().map(|(_, version)| version.clone()),
            "target": target.describe(),
        }),
    ))
}

fn build_phase(
    ctx: &CommandContext<'_>,
    plan: &InstallPlan,
    bootstrap_python: &str,
) -> Result<PathBuf> {
    let progress = ProgressReporter::spinner("Creating build environment");
    let env = buildenv::BuildEnv::provision(ctx, bootstrap_python, &plan.build_root)?;
    progress.finish("build environment ready");

    let progress = ProgressReporter::spinner("Building wheel");
    let wheel = builder::build_wheel(ctx, env.python(), &plan.build_root, &plan.lib_name)?;
    progress.finish(format!("built {}", wheel_file_name(&wheel)));
    Ok(wheel)
}

struct InstallPlan {
    build_root: PathBuf,
    lib: PathBuf,
    lib_name: String,
    noinstall: bool,
    wheeldir: Option<PathBuf>,
}

impl InstallPlan {
    /// The python package sources live in `lammps/` next to `setup.py`; the
    /// shared library is staged there so the build can bundle it.
    fn package_dir(&self) -> PathBuf {
        self.build_root.join("lammps")
    }
}

fn validate_request(request: &InstallRequest) -> Result<InstallPlan> {
    if !request.package.exists() {
        return Err(InstallUserError::new(
            format!("LAMMPS package {} does not exist", request.package.display()),
            json!({
                "reason": "missing_package",
                "path": request.package.display().to_string(),
                "hint": "Point --package at the LAMMPS python package or its setup.py.",
            }),
        )
        .into());
    }
    let package = std::fs::canonicalize(&request.package)
        .with_context(|| format!("failed to resolve {}", request.package.display()))?;

    if !request.lib.exists() {
        return Err(InstallUserError::new(
            format!(
                "LAMMPS shared library {} does not exist",
                request.lib.display()
            ),
            json!({
                "reason": "missing_library",
                "path": request.lib.display().to_string(),
                "hint": "Build the shared library first, then pass its path with --lib.",
            }),
        )
        .into());
    }
    let lib = std::fs::canonicalize(&request.lib)
        .with_context(|| format!("failed to resolve {}", request.lib.display()))?;

    let wheeldir = match &request.wheeldir {
        Some(dir) => {
            if !dir.exists() {
                return Err(InstallUserError::new(
                    format!("directory {} to store the wheel does not exist", dir.display()),
                    json!({
                        "reason": "missing_wheeldir",
                        "path": dir.display().to_string(),
                        "hint": "Create the directory first or drop --wheeldir.",
                    }),
                )
                .into());
            }
            Some(
                std::fs::canonicalize(dir)
                    .with_context(|| format!("failed to resolve {}", dir.display()))?,
            )
        }
        None => None,
    };

    let build_root = package
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("package path {} has no parent directory", package.display()))?;
    let lib_name = lib
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("non-utf8 path {}", lib.display()))?;

    Ok(InstallPlan {
        build_root,
        lib,
        lib_name,
        noinstall: request.noinstall,
        wheeldir,
    })
}

pub(crate) fn path_arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("non-utf8 path {}", path.display()))
}
