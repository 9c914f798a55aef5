use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{PythonRuntime, SharedRuntime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Build,
    Install,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Build => "build",
            CommandGroup::Install => "install",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

/// Shared state threaded through a single command execution.
pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    env: EnvSnapshot,
    config: Config,
    invoked_from: PathBuf,
    runtime: SharedRuntime,
}

impl<'a> CommandContext<'a> {
    /// Captures the environment and working directory for one command run.
    ///
    /// # Errors
    /// Returns an error when the current directory cannot be resolved.
    pub fn new(global: &'a GlobalOptions, runtime: SharedRuntime) -> Result<Self> {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env);
        let invoked_from =
            std::env::current_dir().context("resolving the current working directory")?;
        Ok(Self {
            global,
            env,
            config,
            invoked_from,
            runtime,
        })
    }

    pub fn python_runtime(&self) -> &dyn PythonRuntime {
        self.runtime.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory the command was started from. Finished wheels land here when
    /// no wheel directory is given.
    #[must_use]
    pub fn invoked_from(&self) -> &Path {
        &self.invoked_from
    }

    pub fn env_contains(&self, key: &str) -> bool {
        self.env.contains(key)
    }

    #[cfg(test)]
    pub(crate) fn testing(
        global: &'a GlobalOptions,
        runtime: SharedRuntime,
        vars: &[(&str, &str)],
        invoked_from: &Path,
    ) -> Self {
        let env = EnvSnapshot::testing(vars);
        let config = Config::from_snapshot(&env);
        Self {
            global,
            env,
            config,
            invoked_from: invoked_from.to_path_buf(),
            runtime,
        }
    }
}
