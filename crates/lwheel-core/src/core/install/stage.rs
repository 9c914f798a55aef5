use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::fs::{copy_file, remove_dir_all_writable};
use crate::wheel::find_project_wheels;

/// Removes wheels left over from earlier runs so a directory scan after the
/// build finds only the fresh artifact.
pub(crate) fn purge_stale_wheels(build_root: &Path) -> Result<usize> {
    let mut purged = 0usize;
    for wheel in find_project_wheels(build_root)? {
        tracing::debug!(wheel = %wheel.display(), "removing stale wheel");
        fs::remove_file(&wheel)
            .with_context(|| format!("failed to remove stale wheel {}", wheel.display()))?;
        purged += 1;
    }
    Ok(purged)
}

/// Copy of the shared library placed inside the python package directory so
/// the build can bundle it. The copy is removed again when the guard drops.
pub(crate) struct StagedLibrary {
    path: PathBuf,
}

impl StagedLibrary {
    pub(crate) fn create(package_dir: &Path, lib: &Path, lib_name: &str) -> Result<Self> {
        let path = package_dir.join(lib_name);
        copy_file(lib, &path)?;
        tracing::debug!(path = %path.display(), "staged shared library");
        Ok(Self { path })
    }
}

impl Drop for StagedLibrary {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Clears the residue setuptools leaves in the build root (`build/` and
/// `*.egg-info`). Best effort; leftovers only waste disk space.
pub(crate) fn remove_build_residue(build_root: &Path) {
    let _ = remove_dir_all_writable(&build_root.join("build"));
    let Ok(entries) = fs::read_dir(build_root) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(".egg-info") {
            let _ = remove_dir_all_writable(&entry.path());
        }
    }
}
