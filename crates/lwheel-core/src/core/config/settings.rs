use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) build: BuildConfig,
}

impl Config {
    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            build: BuildConfig {
                keep_env: snapshot.flag_is_enabled("LWHEEL_KEEP_BUILDENV"),
            },
        }
    }

    #[must_use]
    pub fn build(&self) -> &BuildConfig {
        &self.build
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub keep_env: bool,
}
