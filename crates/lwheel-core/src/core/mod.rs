//! Internal implementation modules for `lwheel-core`.
//!
//! Most callers should go through the crate root re-exports rather than
//! importing these modules directly.

pub mod config;
pub mod effects;
pub mod fs;
pub mod install;
pub mod outcome;
pub mod process;
pub mod progress;
pub mod python;
pub mod wheel;
