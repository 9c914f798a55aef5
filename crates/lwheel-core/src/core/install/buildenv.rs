use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;

use crate::context::CommandContext;
use crate::fs::ScratchDir;
use crate::outcome::InstallFailure;
use crate::python::venv_python;

use super::path_arg;

pub(crate) const BUILD_ENV_PREFIX: &str = ".lwheel-build-";

/// Throwaway virtual environment the wheel build runs in. The directory is
/// removed when the value drops unless `LWHEEL_KEEP_BUILDENV=1` disarmed it.
pub(crate) struct BuildEnv {
    _scratch: Option<ScratchDir>,
    python: PathBuf,
}

impl BuildEnv {
    pub(crate) fn provision(
        ctx: &CommandContext<'_>,
        bootstrap_python: &str,
        build_root: &Path,
    ) -> Result<Self> {
        let scratch = ScratchDir::new_in(build_root, BUILD_ENV_PREFIX)?;
        let env_root = scratch.path().to_path_buf();
        tracing::debug!(path = %env_root.display(), "creating virtual environment");

        let args = vec![
            "-m".to_string(),
            "venv".to_string(),
            path_arg(&env_root)?,
        ];
        let output = ctx
            .python_runtime()
            .run_command(bootstrap_python, &args, &[], build_root)?;
        if output.code != 0 {
            return Err(InstallFailure::new(
                "failed to create a virtual environment",
                json!({
                    "python": bootstrap_python,
                    "exit_code": output.code,
                    "output": output.combined(),
                }),
            )
            .into());
        }

        let python = venv_python(&env_root);
        let scratch = if ctx.config().build().keep_env {
            let kept = scratch.keep();
            tracing::info!(path = %kept.display(), "keeping build environment");
            None
        } else {
            Some(scratch)
        };
        Ok(Self {
            _scratch: scratch,
            python,
        })
    }

    pub(crate) fn python(&self) -> &Path {
        &self.python
    }
}
