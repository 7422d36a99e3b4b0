use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<parent>/boundary/<name>`, optionally with a new extension (leading dot
/// optional). Parent directories are created.
pub fn boundary_path(base: &Path, extension: Option<&str>) -> Result<PathBuf> {
    let parent = base.parent().unwrap_or_else(|| Path::new(""));
    let mut path = parent.join("boundary");
    if let Some(name) = base.file_name() {
        path.push(name);
    }

    if let Some(ext) = extension.filter(|e| !e.is_empty()) {
        path.set_extension(ext.trim_start_matches('.'));
    }

    ensure_parent(&path)?;
    Ok(path)
}

/// `<parent>/<dir>/<stem>.txt`. Parent directories are created.
pub fn sibling_path(base: &Path, dir: &str) -> Result<PathBuf> {
    sibling_path_with_ext(base, dir, "txt")
}

pub fn sibling_path_with_ext(base: &Path, dir: &str, ext: &str) -> Result<PathBuf> {
    let parent = base.parent().unwrap_or_else(|| Path::new(""));
    let mut path = parent.join(dir);
    if let Some(stem) = base.file_stem() {
        path.push(stem);
    }
    path.set_extension(ext);

    ensure_parent(&path)?;
    Ok(path)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {parent:?}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("fbd-paths-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_boundary_path() {
        let dir = scratch_dir("boundary");
        let base = dir.join("face.obj");

        let p = boundary_path(&base, None).unwrap();
        assert_eq!(p, dir.join("boundary").join("face.obj"));
        assert!(dir.join("boundary").is_dir());

        assert_eq!(
            boundary_path(&base, Some(".ply")).unwrap(),
            dir.join("boundary").join("face.ply")
        );
        assert_eq!(
            boundary_path(&base, Some("txt")).unwrap(),
            dir.join("boundary").join("face.txt")
        );
        assert_eq!(
            boundary_path(&base, Some("")).unwrap(),
            dir.join("boundary").join("face.obj")
        );
    }

    #[test]
    fn test_sibling_path() {
        let dir = scratch_dir("sibling");
        let base = dir.join("face.obj");

        let p = sibling_path(&base, "keypoints").unwrap();
        assert_eq!(p, dir.join("keypoints").join("face.txt"));
        assert!(dir.join("keypoints").is_dir());

        assert_eq!(
            sibling_path_with_ext(&base, "debug", "png").unwrap(),
            dir.join("debug").join("face.png")
        );
    }
}
