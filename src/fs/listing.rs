use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Type of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
    Symlink,
}

/// One row of the directory listing.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub name: String,
    pub path: PathBuf,
    pub node_type: NodeType,
    pub is_hidden: bool,
}

impl ListEntry {
    fn new(path: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let node_type = if metadata.is_symlink() {
            NodeType::Symlink
        } else if metadata.is_dir() {
            NodeType::Directory
        } else {
            NodeType::File
        };
        Ok(Self {
            is_hidden: name.starts_with('.'),
            name,
            path: path.to_path_buf(),
            node_type,
        })
    }

    /// Directories, and symlinks that point at one.
    pub fn is_dir_like(&self) -> bool {
        match self.node_type {
            NodeType::Directory => true,
            NodeType::Symlink => self.path.is_dir(),
            NodeType::File => false,
        }
    }
}

/// Flat listing of one directory, directories first.
#[derive(Debug)]
pub struct DirListing {
    pub dir: PathBuf,
    pub entries: Vec<ListEntry>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub show_hidden: bool,
}

impl DirListing {
    pub fn new(dir: &Path, show_hidden: bool) -> Result<Self> {
        let mut listing = Self {
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            show_hidden,
        };
        listing.reload()?;
        Ok(listing)
    }

    /// Re-read the directory, keeping the selected name when it survives.
    /// Unreadable entries are skipped.
    pub fn reload(&mut self) -> Result<()> {
        let keep = self.selected().map(|e| e.name.clone());
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let Ok(entry) = entry else {
                continue;
            };
            let Ok(item) = ListEntry::new(&entry.path()) else {
                continue;
            };
            if item.is_hidden && !self.show_hidden {
                continue;
            }
            entries.push(item);
        }
        entries.sort_by(|a, b| {
            b.is_dir_like()
                .cmp(&a.is_dir_like())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        self.entries = entries;
        self.selected_index = keep
            .and_then(|name| self.entries.iter().position(|e| e.name == name))
            .unwrap_or(0);
        Ok(())
    }

    /// Switch to `dir`. On failure the listing is unchanged.
    pub fn change_dir(&mut self, dir: &Path) -> Result<()> {
        let previous = std::mem::replace(&mut self.dir, dir.to_path_buf());
        let old_index = self.selected_index;
        self.selected_index = 0;
        self.scroll_offset = 0;
        let keep_entries = std::mem::take(&mut self.entries);
        if let Err(e) = self.reload() {
            self.dir = previous;
            self.entries = keep_entries;
            self.selected_index = old_index;
            return Err(e);
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<&ListEntry> {
        self.entries.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.entries.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.entries.len().saturating_sub(1);
    }

    /// Enter the selected directory. Returns the new directory.
    pub fn enter_selected(&mut self) -> Result<Option<PathBuf>> {
        let Some(target) = self
            .selected()
            .filter(|e| e.is_dir_like())
            .map(|e| e.path.clone())
        else {
            return Ok(None);
        };
        self.change_dir(&target)?;
        Ok(Some(target))
    }

    /// Go to the parent directory, selecting the one just left.
    pub fn go_parent(&mut self) -> Result<Option<PathBuf>> {
        let Some(parent) = self.dir.parent().map(Path::to_path_buf) else {
            return Ok(None);
        };
        let left = self.dir.file_name().map(|n| n.to_string_lossy().to_string());
        self.change_dir(&parent)?;
        if let Some(idx) = left.and_then(|name| self.entries.iter().position(|e| e.name == name)) {
            self.selected_index = idx;
        }
        Ok(Some(parent))
    }

    /// Adjust scroll offset so the selection stays visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index + 1 - visible_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_file.txt"), "b").unwrap();
        fs::write(dir.path().join("A_file.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("z_dir")).unwrap();
        fs::create_dir(dir.path().join("m_dir")).unwrap();
        fs::write(dir.path().join(".hidden"), "h").unwrap();
        dir
    }

    fn names(listing: &DirListing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn sorts_dirs_first_and_skips_hidden() {
        let dir = setup_test_dir();
        let listing = DirListing::new(dir.path(), false).unwrap();
        assert_eq!(
            names(&listing),
            vec!["m_dir", "z_dir", "A_file.txt", "b_file.txt"]
        );
    }

    #[test]
    fn show_hidden_includes_dotfiles() {
        let dir = setup_test_dir();
        let listing = DirListing::new(dir.path(), true).unwrap();
        assert!(names(&listing).contains(&".hidden"));
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_previous();
        assert_eq!(listing.selected_index, 0);
        listing.select_last();
        listing.select_next();
        assert_eq!(listing.selected_index, 3);
        listing.select_first();
        assert_eq!(listing.selected().unwrap().name, "m_dir");
    }

    #[test]
    fn enter_and_go_parent() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_next();
        let entered = listing.enter_selected().unwrap();
        assert_eq!(entered, Some(dir.path().join("z_dir")));
        assert!(listing.entries.is_empty());

        let parent = listing.go_parent().unwrap();
        assert_eq!(parent, Some(dir.path().to_path_buf()));
        assert_eq!(listing.selected().unwrap().name, "z_dir");
    }

    #[test]
    fn enter_on_file_does_nothing() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_last();
        assert_eq!(listing.enter_selected().unwrap(), None);
        assert_eq!(listing.dir, dir.path());
    }

    #[test]
    fn failed_change_dir_keeps_state() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_next();
        assert!(listing.change_dir(&dir.path().join("missing")).is_err());
        assert_eq!(listing.dir, dir.path());
        assert_eq!(listing.entries.len(), 4);
        assert_eq!(listing.selected_index, 1);
    }

    #[test]
    fn reload_keeps_selected_name() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_next();
        fs::create_dir(dir.path().join("a_dir")).unwrap();
        listing.reload().unwrap();
        assert_eq!(listing.selected().unwrap().name, "z_dir");
        assert_eq!(listing.selected_index, 2);
    }

    #[test]
    fn update_scroll_follows_selection() {
        let dir = setup_test_dir();
        let mut listing = DirListing::new(dir.path(), false).unwrap();
        listing.select_last();
        listing.update_scroll(2);
        assert_eq!(listing.scroll_offset, 2);
        listing.select_first();
        listing.update_scroll(2);
        assert_eq!(listing.scroll_offset, 0);
    }
}
