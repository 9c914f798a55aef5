use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::process::{run_command, RunOutput};
use crate::python::detect_interpreter;

/// Seam for everything that talks to a Python interpreter, so the pipeline
/// can run against a scripted stand-in under test.
pub trait PythonRuntime: Send + Sync {
    fn detect_interpreter(&self) -> Result<String>;

    fn run_command(
        &self,
        python: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> Result<RunOutput>;
}

pub struct SystemPythonRuntime;

impl PythonRuntime for SystemPythonRuntime {
    fn detect_interpreter(&self) -> Result<String> {
        detect_interpreter()
    }

    fn run_command(
        &self,
        python: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> Result<RunOutput> {
        run_command(python, args, envs, cwd)
    }
}

pub type SharedRuntime = Arc<dyn PythonRuntime>;
