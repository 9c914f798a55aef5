use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::context::CommandContext;
use crate::outcome::InstallFailure;
use crate::process::RunOutput;
use crate::wheel::wheel_file_name;

use super::path_arg;

/// Marker pip prints when an old distutils-installed module blocks the
/// reinstall. pip cannot remove those, so retrying elsewhere would only hide
/// the conflict.
pub(crate) const DISTUTILS_CONFLICT_MARKER: &str = "distutils installed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstallTarget {
    VirtualEnv,
    System,
    User,
}

impl InstallTarget {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            InstallTarget::VirtualEnv => "virtual environment",
            InstallTarget::System => "system site-packages",
            InstallTarget::User => "user site-packages",
        }
    }
}

/// Installs the wheel with pip. An active virtual environment wins; otherwise
/// the bootstrap interpreter's site-packages is tried first with a `--user`
/// retry as the fallback.
pub(crate) fn install_wheel(
    ctx: &CommandContext<'_>,
    bootstrap_python: &str,
    wheel: &Path,
    build_root: &Path,
) -> Result<InstallTarget> {
    let (python, target) = if ctx.env_contains("VIRTUAL_ENV") {
        ("python".to_string(), InstallTarget::VirtualEnv)
    } else {
        (bootstrap_python.to_string(), InstallTarget::System)
    };
    tracing::info!(target = target.describe(), "installing wheel");

    let first = run_pip_install(ctx, &python, wheel, build_root, false)?;
    if first.code == 0 {
        return Ok(target);
    }

    let output = first.combined();
    if output.contains(DISTUTILS_CONFLICT_MARKER) {
        return Err(InstallFailure::new(
            "an older distutils-installed LAMMPS python module is in the way",
            json!({
                "exit_code": first.code,
                "output": output,
                "hint": "Uninstall the existing LAMMPS python module manually first, then rerun.",
            }),
        )
        .into());
    }

    tracing::warn!(
        target = target.describe(),
        exit_code = first.code,
        "install failed; retrying in the user folder"
    );
    let second = run_pip_install(ctx, bootstrap_python, wheel, build_root, true)?;
    if second.code == 0 {
        return Ok(InstallTarget::User);
    }

    Err(InstallFailure::new(
        format!("failed to install wheel {}", wheel_file_name(wheel)),
        json!({
            "exit_code": second.code,
            "output": second.combined(),
        }),
    )
    .into())
}

fn run_pip_install(
    ctx: &CommandContext<'_>,
    python: &str,
    wheel: &Path,
    build_root: &Path,
    user_site: bool,
) -> Result<RunOutput> {
    let mut args = vec!["-m".to_string(), "pip".to_string(), "install".to_string()];
    if user_site {
        args.push("--user".to_string());
    }
    args.push("--force-reinstall".to_string());
    args.push(path_arg(wheel)?);
    ctx.python_runtime()
        .run_command(python, &args, &[], build_root)
}
