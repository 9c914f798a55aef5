use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

/// Best-effort recursive chmod for trees that may contain read-only entries.
/// Symlinks are left alone so a link inside the tree cannot widen permissions
/// elsewhere.
pub(crate) fn make_writable_recursive(path: &Path) {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return;
    };
    if meta.file_type().is_symlink() {
        return;
    }
    unlock_permissions(path, &meta);
    if meta.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                make_writable_recursive(&entry.path());
            }
        }
    }
}

#[cfg(unix)]
fn unlock_permissions(path: &Path, meta: &fs::Metadata) {
    use std::os::unix::fs::PermissionsExt;
    let mode = if meta.is_dir() { 0o755 } else { 0o644 };
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn unlock_permissions(path: &Path, meta: &fs::Metadata) {
    let mut perms = meta.permissions();
    if perms.readonly() {
        perms.set_readonly(false);
        let _ = fs::set_permissions(path, perms);
    }
}

pub(crate) fn remove_dir_all_writable(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err).with_context(|| format!("failed to stat {}", path.display())),
    };
    if meta.file_type().is_symlink() {
        return fs::remove_file(path)
            .with_context(|| format!("failed to remove symlink {}", path.display()));
    }
    make_writable_recursive(path);
    fs::remove_dir_all(path).with_context(|| format!("failed to remove {}", path.display()))
}

pub(crate) fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)
        .map(|_| ())
        .with_context(|| format!("copying {} to {}", src.display(), dest.display()))
}

/// Self-cleaning scratch directory for throwaway build state.
///
/// Stale siblings sharing the prefix are pruned on creation so crashed runs do
/// not accumulate directories under the build root.
pub(crate) struct ScratchDir {
    inner: Option<tempfile::TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    pub(crate) fn new_in(root: &Path, prefix: &str) -> Result<Self> {
        fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))?;
        prune_stale_tempdirs(root, prefix, Duration::from_secs(24 * 60 * 60));
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(root)
            .with_context(|| format!("failed to create temp dir under {}", root.display()))?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            inner: Some(dir),
            path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Disarms the cleanup and leaves the directory in place.
    pub(crate) fn keep(mut self) -> PathBuf {
        match self.inner.take() {
            Some(dir) => dir.keep(),
            None => self.path.clone(),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let Some(dir) = self.inner.take() else {
            return;
        };
        let path = dir.keep();
        let _ = remove_dir_all_writable(&path);
    }
}

fn prune_stale_tempdirs(root: &Path, prefix: &str, max_age: Duration) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    let now = SystemTime::now();
    for entry in entries.flatten() {
        if is_stale_tempdir(&entry, prefix, now, max_age) {
            let _ = remove_dir_all_writable(&entry.path());
        }
    }
}

fn is_stale_tempdir(
    entry: &fs::DirEntry,
    prefix: &str,
    now: SystemTime,
    max_age: Duration,
) -> bool {
    if !entry.file_type().is_ok_and(|kind| kind.is_dir()) {
        return false;
    }
    if !entry.file_name().to_string_lossy().starts_with(prefix) {
        return false;
    }
    let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
        return false;
    };
    now.duration_since(modified).unwrap_or_default() >= max_age
}
