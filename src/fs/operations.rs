use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Pick a name next to `dest` that does not exist yet by appending
/// `_copy`, `_copy2`, ... to the last component.
pub fn resolve_collision(dest: &Path) -> PathBuf {
    if !dest.exists() {
        return dest.to_path_buf();
    }

    let parent = dest.parent().unwrap_or(Path::new("."));
    let name = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    for i in 1..=1000 {
        let candidate = if i == 1 {
            parent.join(format!("{}_copy", name))
        } else {
            parent.join(format!("{}_copy{}", name, i))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    dest.to_path_buf()
}

/// Copy the directory `src` to `dest`.
///
/// When `dest` is an existing directory the copy is placed inside it under
/// the source's name (with collision resolution); otherwise `dest` becomes
/// the new directory. Returns the path of the copy.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<PathBuf> {
    ensure_dir(src)?;
    let target = if dest.is_dir() {
        resolve_collision(&dest.join(file_name(src)?))
    } else {
        dest.to_path_buf()
    };
    ensure_outside(src, &target)?;
    copy_dir_recursive(src, &target)?;
    tracing::info!(from = %src.display(), to = %target.display(), "copied directory");
    Ok(target)
}

/// Move the directory `src` into the existing directory `dest_dir`.
///
/// Uses `fs::rename` first and falls back to copy + delete when the rename
/// crosses devices. Returns the new path.
pub fn move_dir(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    ensure_dir(src)?;
    let target = resolve_collision(&dest_dir.join(file_name(src)?));
    ensure_outside(src, &target)?;

    if fs::rename(src, &target).is_err() {
        copy_dir_recursive(src, &target)?;
        fs::remove_dir_all(src)?;
    }
    tracing::info!(from = %src.display(), to = %target.display(), "moved directory");
    Ok(target)
}

/// Remove a directory and everything below it.
pub fn erase_dir(path: &Path) -> Result<()> {
    ensure_dir(path)?;
    fs::remove_dir_all(path)?;
    tracing::info!(path = %path.display(), "removed directory");
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        Ok(())
    } else {
        Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            path.display()
        )))
    }
}

/// Refuse targets inside the source tree.
fn ensure_outside(src: &Path, target: &Path) -> Result<()> {
    let src = src.canonicalize()?;
    let anchor = target
        .parent()
        .and_then(|p| p.canonicalize().ok())
        .map(|p| p.join(target.file_name().unwrap_or_default()))
        .unwrap_or_else(|| target.to_path_buf());
    if anchor.starts_with(&src) {
        return Err(AppError::InvalidPath(format!(
            "cannot put {} inside itself",
            src.display()
        )));
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no directory name").into())
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    if src.is_file() {
        fs::copy(src, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_tree(root: &Path) -> PathBuf {
        let src_dir = root.join("src_dir");
        fs::create_dir(&src_dir).unwrap();
        fs::write(src_dir.join("a.txt"), "aaa").unwrap();
        fs::create_dir(src_dir.join("sub")).unwrap();
        fs::write(src_dir.join("sub").join("b.txt"), "bbb").unwrap();
        src_dir
    }

    // === copy_dir tests ===

    #[test]
    fn test_copy_into_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let dest_dir = tmp.path().join("dest");
        fs::create_dir(&dest_dir).unwrap();

        let result = copy_dir(&src_dir, &dest_dir).unwrap();
        assert_eq!(result, dest_dir.join("src_dir"));
        assert_eq!(fs::read_to_string(result.join("a.txt")).unwrap(), "aaa");
        assert_eq!(
            fs::read_to_string(result.join("sub").join("b.txt")).unwrap(),
            "bbb"
        );
        assert!(src_dir.exists());
    }

    #[test]
    fn test_copy_to_new_name() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let dest = tmp.path().join("renamed");

        let result = copy_dir(&src_dir, &dest).unwrap();
        assert_eq!(result, dest);
        assert!(dest.join("sub").join("b.txt").exists());
    }

    #[test]
    fn test_copy_collision_appends_suffix() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let result = copy_dir(&src_dir, tmp.path()).unwrap();
        assert_eq!(result, tmp.path().join("src_dir_copy"));
        assert!(result.join("a.txt").exists());
    }

    #[test]
    fn test_copy_into_itself_fails() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let err = copy_dir(&src_dir, &src_dir.join("sub")).unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }

    #[test]
    fn test_copy_file_source_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert!(copy_dir(&file, &tmp.path().join("out")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_preserves_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        std::os::unix::fs::symlink("a.txt", src_dir.join("link")).unwrap();
        let result = copy_dir(&src_dir, &tmp.path().join("copy")).unwrap();
        let link = result.join("link");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(link).unwrap(), PathBuf::from("a.txt"));
    }

    // === move_dir tests ===

    #[test]
    fn test_move_directory() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let dest_dir = tmp.path().join("dest");
        fs::create_dir(&dest_dir).unwrap();

        let result = move_dir(&src_dir, &dest_dir).unwrap();
        assert_eq!(result, dest_dir.join("src_dir"));
        assert!(result.join("a.txt").exists());
        assert!(!src_dir.exists());
    }

    #[test]
    fn test_move_with_collision() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        let dest_dir = tmp.path().join("dest");
        fs::create_dir_all(dest_dir.join("src_dir")).unwrap();

        let result = move_dir(&src_dir, &dest_dir).unwrap();
        assert_eq!(result, dest_dir.join("src_dir_copy"));
        assert!(dest_dir.join("src_dir").exists());
        assert!(!src_dir.exists());
    }

    #[test]
    fn test_move_into_own_subdirectory_fails() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        assert!(move_dir(&src_dir, &src_dir.join("sub")).is_err());
        assert!(src_dir.join("a.txt").exists());
    }

    // === erase_dir tests ===

    #[test]
    fn test_erase_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        let src_dir = make_tree(tmp.path());
        erase_dir(&src_dir).unwrap();
        assert!(!src_dir.exists());
    }

    #[test]
    fn test_erase_nonexistent_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(erase_dir(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_erase_refuses_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("keep.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(erase_dir(&file), Err(AppError::InvalidPath(_))));
        assert!(file.exists());
    }

    // === resolve_collision tests ===

    #[test]
    fn test_resolve_collision_no_conflict() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("new");
        assert_eq!(resolve_collision(&path), path);
    }

    #[test]
    fn test_resolve_collision_keeps_dotted_names_whole() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("conf.d")).unwrap();
        fs::create_dir(tmp.path().join("conf.d_copy")).unwrap();
        let resolved = resolve_collision(&tmp.path().join("conf.d"));
        assert_eq!(resolved, tmp.path().join("conf.d_copy2"));
    }
}
