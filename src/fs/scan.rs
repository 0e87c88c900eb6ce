use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of directory listings for the tree store.
pub trait DirScanner {
    /// Immediate subdirectories of `dir`, in any order.
    fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether a directory at `path` would be reported by a scan of its
    /// parent, judged by name alone.
    fn admits(&self, _path: &Path) -> bool {
        true
    }
}

/// Scanner backed by the real filesystem.
///
/// Symlinks are never followed, so a link to a directory is not treated
/// as a subdirectory. Entries that cannot be inspected are skipped.
#[derive(Debug, Clone, Default)]
pub struct FsScanner {
    pub show_hidden: bool,
}

impl FsScanner {
    pub fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }
}

impl DirScanner for FsScanner {
    fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let is_dir = match entry.file_type() {
                Ok(ft) => ft.is_dir(),
                Err(_) => continue,
            };
            if !is_dir {
                continue;
            }
            let path = entry.path();
            if self.admits(&path) {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn admits(&self, path: &Path) -> bool {
        self.show_hidden
            || !path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join("alpha").join("nested")).unwrap();
        File::create(dir.path().join("file_a.txt")).unwrap();
        dir
    }

    #[test]
    fn lists_only_immediate_directories() {
        let dir = setup_test_dir();
        let found = FsScanner::new(false).subdirectories(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("alpha"), dir.path().join("beta")]
        );
    }

    #[test]
    fn hidden_directories_included_on_request() {
        let dir = setup_test_dir();
        let found = FsScanner::new(true).subdirectories(dir.path()).unwrap();
        assert!(found.contains(&dir.path().join(".git")));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn admits_follows_hidden_setting() {
        let hidden = Path::new("/p/.cache");
        assert!(!FsScanner::new(false).admits(hidden));
        assert!(FsScanner::new(true).admits(hidden));
        assert!(FsScanner::new(false).admits(Path::new("/p/src")));
        assert!(FsScanner::new(false).admits(Path::new("/")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = FsScanner::default().subdirectories(&dir.path().join("gone"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_skipped() {
        let dir = setup_test_dir();
        std::os::unix::fs::symlink(dir.path().join("alpha"), dir.path().join("link")).unwrap();
        let found = FsScanner::new(false).subdirectories(dir.path()).unwrap();
        assert!(!found.contains(&dir.path().join("link")));
    }
}
