use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

pub(crate) const WHEEL_PREFIX: &str = "lammps-";

/// True for artifacts this pipeline produces (`lammps-*.whl`).
pub(crate) fn is_project_wheel(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.starts_with(WHEEL_PREFIX)
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("whl"))
}

/// Scans a directory for project wheels, sorted for deterministic handling.
pub(crate) fn find_project_wheels(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut wheels = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_project_wheel(&path) {
            wheels.push(path);
        }
    }
    wheels.sort();
    Ok(wheels)
}

pub(crate) fn wheel_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Splits a wheel file name into its distribution and version components.
///
/// `lammps-2023.8.2-cp311-cp311-linux_x86_64.whl` parses to
/// `("lammps", "2023.8.2")`. Names outside the wheel naming scheme yield
/// `None`.
pub(crate) fn parse_name_version(path: &Path) -> Option<(String, String)> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".whl")?;
    let mut parts = stem.split('-');
    let distribution = parts.next()?;
    let version = parts.next()?;
    if distribution.is_empty() || version.is_empty() {
        return None;
    }
    Some((distribution.to_string(), version.to_string()))
}

/// Moves a finished wheel into `dest_dir` and returns its final path.
///
/// A copy plus remove so the move also works across filesystems. Moving a
/// wheel onto its own directory is a no-op.
pub(crate) fn relocate_wheel(wheel: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = wheel
        .file_name()
        .ok_or_else(|| anyhow!("wheel path {} has no file name", wheel.display()))?;
    if wheel.parent() == Some(dest_dir) {
        return Ok(wheel.to_path_buf());
    }
    let dest = dest_dir.join(name);
    crate::fs::copy_file(wheel, &dest)?;
    fs::remove_file(wheel).with_context(|| format!("failed to remove {}", wheel.display()))?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_project_wheels_by_prefix_and_extension() {
        assert!(is_project_wheel(Path::new(
            "lammps-2023.8.2-cp311-cp311-linux_x86_64.whl"
        )));
        assert!(is_project_wheel(Path::new("/build/lammps-1.0-py3-none-any.WHL")));
        assert!(!is_project_wheel(Path::new("numpy-1.26.0-py3-none-any.whl")));
        assert!(!is_project_wheel(Path::new("lammps-2023.8.2.tar.gz")));
        assert!(!is_project_wheel(Path::new("lammps-notes.whl.txt")));
    }

    #[test]
    fn parses_distribution_and_version() {
        let parsed = parse_name_version(Path::new("lammps-2023.8.2-cp311-cp311-linux_x86_64.whl"));
        assert_eq!(
            parsed,
            Some(("lammps".to_string(), "2023.8.2".to_string()))
        );
        assert_eq!(parse_name_version(Path::new("lammps.tar.gz")), None);
        assert_eq!(parse_name_version(Path::new("-1.0-py3-none-any.whl")), None);
    }

    #[test]
    fn finds_only_matching_wheels() -> Result<()> {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("lammps-2.0-py3-none-any.whl"), b"b")?;
        fs::write(temp.path().join("lammps-1.0-py3-none-any.whl"), b"a")?;
        fs::write(temp.path().join("numpy-1.0-py3-none-any.whl"), b"c")?;
        fs::write(temp.path().join("lammps-notes.txt"), b"d")?;
        fs::create_dir(temp.path().join("lammps-3.0-py3-none-any.whl"))?;

        let wheels = find_project_wheels(temp.path())?;
        let names: Vec<String> = wheels.iter().map(|p| wheel_file_name(p)).collect();
        assert_eq!(
            names,
            vec![
                "lammps-1.0-py3-none-any.whl".to_string(),
                "lammps-2.0-py3-none-any.whl".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn relocates_across_directories_and_skips_same_dir() -> Result<()> {
        let temp = tempfile::tempdir().expect("tempdir");
        let src_dir = temp.path().join("src");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(&src_dir)?;
        fs::create_dir_all(&dest_dir)?;
        let wheel = src_dir.join("lammps-1.0-py3-none-any.whl");
        fs::write(&wheel, b"wheel-bytes")?;

        let moved = relocate_wheel(&wheel, &dest_dir)?;
        assert_eq!(moved, dest_dir.join("lammps-1.0-py3-none-any.whl"));
        assert!(!wheel.exists(), "source wheel should be removed");
        assert_eq!(fs::read(&moved)?, b"wheel-bytes");

        let unmoved = relocate_wheel(&moved, &dest_dir)?;
        assert_eq!(unmoved, moved);
        assert!(moved.exists());
        Ok(())
    }
}
