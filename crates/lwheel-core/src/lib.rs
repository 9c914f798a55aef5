#![deny(clippy::all)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::config::context;
pub(crate) use crate::core::{effects, fs, outcome, process, progress, python, wheel};

pub use crate::core::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::core::config::{BuildConfig, Config, GlobalOptions};
pub use crate::core::effects::{PythonRuntime, SharedRuntime, SystemPythonRuntime};
pub use crate::core::install::{execute, run_install, InstallRequest};
pub use crate::core::outcome::{
    format_status_message, to_json_response, CommandStatus, ExecutionOutcome, InstallFailure,
    InstallUserError,
};
pub use crate::core::process::RunOutput;
