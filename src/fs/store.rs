//! Shared store of known directories.
//!
//! Records live in an arena and are chained by `prev`/`next` into a single
//! sequence ordered by path. Because `Path` ordering compares component by
//! component, that sequence is a depth-first pre-order walk of the tree: a
//! record's subtree is the run of following records that are deeper than it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fs::scan::DirScanner;

/// Version written to and accepted from the tree file.
pub const TREE_FILE_VERSION: u32 = 1;

/// Handle shared by every view over the same store.
pub type StoreHandle = Rc<RefCell<TreeStore>>;

/// Index of a record in the store arena. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// Registration token returned by [`TreeStore::add_remove_hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId(u64);

/// One known directory.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Full normalized path, unique in the store.
    pub path: PathBuf,
    /// Last path component (the full path for a filesystem root).
    pub name: String,
    /// Number of normal components in `path`.
    pub depth: usize,
    /// Bit `d` set: a connector must be drawn at column `d` on this row.
    pub sibling_mask: u64,
    pub prev: Option<EntryId>,
    pub next: Option<EntryId>,
}

/// Snapshot passed to removal hooks just before a record is unlinked.
#[derive(Debug)]
pub struct RemovedEntry<'a> {
    pub id: EntryId,
    pub path: &'a Path,
    pub prev: Option<EntryId>,
    pub next: Option<EntryId>,
}

pub type RemoveHook = Box<dyn FnMut(&RemovedEntry<'_>)>;

#[derive(Debug, Serialize, Deserialize)]
struct TreeFile {
    version: u32,
    entries: Vec<PathBuf>,
}

pub struct TreeStore {
    slots: Vec<Option<DirEntry>>,
    index: BTreeMap<PathBuf, EntryId>,
    first: Option<EntryId>,
    last: Option<EntryId>,
    hooks: Vec<(HookId, RemoveHook)>,
    next_hook: u64,
    scanner: Box<dyn DirScanner>,
    tree_file: Option<PathBuf>,
    loaded: bool,
    dirty: bool,
}

impl TreeStore {
    /// Create an empty store. `tree_file` is where the directory list is
    /// persisted; `None` keeps the store in memory only.
    pub fn new(scanner: Box<dyn DirScanner>, tree_file: Option<PathBuf>) -> Self {
        Self {
            slots: Vec::new(),
            index: BTreeMap::new(),
            first: None,
            last: None,
            hooks: Vec::new(),
            next_hook: 0,
            scanner,
            tree_file,
            loaded: false,
            dirty: false,
        }
    }

    /// Wrap the store for sharing between views.
    pub fn into_handle(self) -> StoreHandle {
        Rc::new(RefCell::new(self))
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn get(&self, id: EntryId) -> Option<&DirEntry> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Head of the sequence, i.e. the lowest-sorted path.
    pub fn first(&self) -> Option<EntryId> {
        self.first
    }

    pub fn last(&self) -> Option<EntryId> {
        self.last
    }

    pub fn next_of(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).and_then(|e| e.next)
    }

    pub fn prev_of(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).and_then(|e| e.prev)
    }

    pub fn depth_of(&self, id: EntryId) -> Option<usize> {
        self.get(id).map(|e| e.depth)
    }

    pub fn path_of(&self, id: EntryId) -> Option<&Path> {
        self.get(id).map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether the store changed since it was loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &DirEntry)> + '_ {
        let mut cursor = self.first;
        std::iter::from_fn(move || {
            let id = cursor?;
            let entry = self.get(id)?;
            cursor = entry.next;
            Some((id, entry))
        })
    }

    /// Look up a record by path.
    pub fn whereis(&self, path: &Path) -> Option<EntryId> {
        self.index.get(&normalize(path)).copied()
    }

    /// Whether a rescan of `path`'s parent would list `path`.
    pub fn admits(&self, path: &Path) -> bool {
        self.scanner.admits(path)
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Insert `path` (and any missing ancestors) at its sorted position.
    /// Returns the id of the existing record if the path is already known.
    pub fn add_entry(&mut self, path: &Path) -> EntryId {
        let id = self.insert_with_ancestors(&normalize(path));
        self.recompute_masks();
        id
    }

    /// Remove `path` and its whole subtree. Descendants go first, in
    /// sequence order; every removal notifies the registered hooks before
    /// the record is unlinked. Returns whether anything was removed.
    pub fn remove_entry(&mut self, path: &Path) -> bool {
        let Some(base) = self.whereis(path) else {
            return false;
        };
        let doomed: Vec<EntryId> = self.subtree_of(base).collect();
        for id in doomed {
            self.unlink(id);
        }
        self.unlink(base);
        self.recompute_masks();
        self.dirty = true;
        tracing::debug!(path = %path.display(), remaining = self.len(), "removed tree entry");
        true
    }

    /// Re-read the immediate subdirectories of `dir`, adding new ones and
    /// dropping (with their subtrees) the ones that disappeared. `dir` itself
    /// is added if it was not known.
    pub fn rescan(&mut self, dir: &Path) -> Result<()> {
        let dir = normalize(dir);
        let found: HashSet<PathBuf> = self
            .scanner
            .subdirectories(&dir)?
            .iter()
            .map(|p| normalize(p))
            .collect();

        let base = self.insert_with_ancestors(&dir);
        let stale: Vec<PathBuf> = self
            .children_of(base)
            .filter_map(|id| self.get(id))
            .filter(|e| !found.contains(&e.path))
            .map(|e| e.path.clone())
            .collect();
        for path in &stale {
            self.remove_entry(path);
        }
        let mut added = 0;
        for path in &found {
            if !self.index.contains_key(path) {
                self.insert(path.clone());
                added += 1;
            }
        }
        self.recompute_masks();
        tracing::debug!(
            dir = %dir.display(),
            added,
            removed = stale.len(),
            "rescanned directory"
        );
        Ok(())
    }

    /// Rescan `dir` and every directory below it, so a freshly created
    /// subtree appears complete.
    pub fn rescan_subtree(&mut self, dir: &Path) -> Result<()> {
        let mut pending = vec![normalize(dir)];
        while let Some(next) = pending.pop() {
            self.rescan(&next)?;
            if let Some(id) = self.whereis(&next) {
                pending.extend(
                    self.children_of(id)
                        .filter_map(|child| self.path_of(child))
                        .map(Path::to_path_buf),
                );
            }
        }
        Ok(())
    }

    /// Register a callback invoked synchronously for every removed record.
    pub fn add_remove_hook(&mut self, hook: RemoveHook) -> HookId {
        let id = HookId(self.next_hook);
        self.next_hook += 1;
        self.hooks.push((id, hook));
        id
    }

    /// Unregister a hook. Unknown ids are ignored.
    pub fn remove_remove_hook(&mut self, id: HookId) {
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
    }

    /// Number of registered removal hooks, one per open view.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Read the tree file once. A missing file leaves the store as is;
    /// later calls do nothing.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;
        let Some(file) = self.tree_file.clone() else {
            return Ok(());
        };
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let parsed: TreeFile = serde_json::from_str(&text)?;
        if parsed.version != TREE_FILE_VERSION {
            return Err(AppError::Store(format!(
                "unsupported tree file version {}",
                parsed.version
            )));
        }
        for path in parsed.entries {
            self.insert_with_ancestors(&normalize(&path));
        }
        self.recompute_masks();
        self.dirty = false;
        tracing::info!(file = %file.display(), entries = self.len(), "loaded directory tree");
        Ok(())
    }

    /// Write the directory list to the tree file if anything changed.
    pub fn save(&mut self) -> Result<()> {
        let Some(file) = self.tree_file.as_ref() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = TreeFile {
            version: TREE_FILE_VERSION,
            entries: self.iter().map(|(_, e)| e.path.clone()).collect(),
        };
        fs::write(file, serde_json::to_string_pretty(&content)?)?;
        self.dirty = false;
        tracing::info!(file = %file.display(), entries = self.len(), "saved directory tree");
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────

    fn insert_with_ancestors(&mut self, path: &Path) -> EntryId {
        let mut missing: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .take_while(|p| !self.index.contains_key(*p))
            .map(Path::to_path_buf)
            .collect();
        missing.reverse();
        for ancestor in missing {
            self.insert(ancestor);
        }
        self.insert(path.to_path_buf())
    }

    fn insert(&mut self, path: PathBuf) -> EntryId {
        if let Some(&id) = self.index.get(&path) {
            return id;
        }
        let prev = self.index.range(..path.clone()).next_back().map(|(_, id)| *id);
        let next = self.index.range(path.clone()..).next().map(|(_, id)| *id);

        let id = EntryId(self.slots.len());
        let name = display_name(&path);
        let depth = depth_of(&path);
        self.slots.push(Some(DirEntry {
            path: path.clone(),
            name,
            depth,
            sibling_mask: 0,
            prev,
            next,
        }));
        self.index.insert(path, id);

        match prev {
            Some(p) => self.set_next(p, Some(id)),
            None => self.first = Some(id),
        }
        match next {
            Some(n) => self.set_prev(n, Some(id)),
            None => self.last = Some(id),
        }
        self.dirty = true;
        id
    }

    fn unlink(&mut self, id: EntryId) {
        let Some(entry) = self.get(id) else {
            return;
        };
        let (prev, next) = (entry.prev, entry.next);
        let path = entry.path.clone();

        let removed = RemovedEntry {
            id,
            path: &path,
            prev,
            next,
        };
        for (_, hook) in self.hooks.iter_mut() {
            hook(&removed);
        }

        match prev {
            Some(p) => self.set_next(p, next),
            None => self.first = next,
        }
        match next {
            Some(n) => self.set_prev(n, prev),
            None => self.last = prev,
        }
        self.index.remove(&path);
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    fn set_next(&mut self, id: EntryId, next: Option<EntryId>) {
        if let Some(Some(entry)) = self.slots.get_mut(id.0) {
            entry.next = next;
        }
    }

    fn set_prev(&mut self, id: EntryId, prev: Option<EntryId>) {
        if let Some(Some(entry)) = self.slots.get_mut(id.0) {
            entry.prev = prev;
        }
    }

    /// Records following `base` that are deeper than it.
    fn subtree_of(&self, base: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        let base_depth = self.depth_of(base).unwrap_or(0);
        let mut cursor = self.next_of(base);
        std::iter::from_fn(move || {
            let id = cursor?;
            let entry = self.get(id)?;
            if entry.depth <= base_depth {
                return None;
            }
            cursor = entry.next;
            Some(id)
        })
    }

    fn children_of(&self, base: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        let child_depth = self.depth_of(base).unwrap_or(0) + 1;
        self.subtree_of(base)
            .filter(move |id| self.depth_of(*id) == Some(child_depth))
    }

    /// Walk the sequence backwards: a record carries its own depth bit and
    /// every bit of the following record up to its own depth.
    fn recompute_masks(&mut self) {
        let mut mask: u64 = 0;
        let mut cursor = self.last;
        while let Some(id) = cursor {
            let Some(Some(entry)) = self.slots.get_mut(id.0) else {
                break;
            };
            mask = (mask | depth_bit(entry.depth)) & bits_through(entry.depth);
            entry.sibling_mask = mask;
            cursor = entry.prev;
        }
    }
}

/// Bit for a depth; depths beyond the mask width draw no connector.
pub fn depth_bit(depth: usize) -> u64 {
    if depth < 64 {
        1 << depth
    } else {
        0
    }
}

fn bits_through(depth: usize) -> u64 {
    if depth >= 63 {
        u64::MAX
    } else {
        (2u64 << depth) - 1
    }
}

/// Drop `.` components, doubled and trailing separators.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn depth_of(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::io;
    use tempfile::TempDir;

    /// Scanner answering from a fixed table.
    #[derive(Default)]
    pub(crate) struct FakeScanner {
        pub dirs: HashMap<PathBuf, Vec<PathBuf>>,
    }

    impl FakeScanner {
        pub(crate) fn with(entries: &[(&str, &[&str])]) -> Self {
            let dirs = entries
                .iter()
                .map(|(dir, subs)| {
                    (
                        PathBuf::from(dir),
                        subs.iter().map(|s| Path::new(dir).join(s)).collect(),
                    )
                })
                .collect();
            Self { dirs }
        }
    }

    impl DirScanner for FakeScanner {
        fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
            self.dirs
                .get(dir)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
        }
    }

    pub(crate) fn store_with(paths: &[&str]) -> TreeStore {
        let mut store = TreeStore::new(Box::new(FakeScanner::default()), None);
        for p in paths {
            store.add_entry(Path::new(p));
        }
        store
    }

    fn paths(store: &TreeStore) -> Vec<String> {
        store
            .iter()
            .map(|(_, e)| e.path.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn sequence_is_preorder() {
        let store = store_with(&["/b", "/a/x", "/a b", "/a", "/"]);
        assert_eq!(paths(&store), vec!["/", "/a", "/a/x", "/a b", "/b"]);
    }

    #[test]
    fn add_entry_creates_missing_ancestors() {
        let store = store_with(&["/home/user/src"]);
        assert_eq!(paths(&store), vec!["/", "/home", "/home/user", "/home/user/src"]);
    }

    #[test]
    fn add_entry_is_idempotent() {
        let mut store = store_with(&["/", "/a"]);
        let id = store.whereis(Path::new("/a")).unwrap();
        assert_eq!(store.add_entry(Path::new("/a/")), id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn depth_and_name() {
        let store = store_with(&["/", "/usr/lib"]);
        let root = store.get(store.whereis(Path::new("/")).unwrap()).unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.name, "/");
        let lib = store.get(store.whereis(Path::new("/usr/lib")).unwrap()).unwrap();
        assert_eq!(lib.depth, 2);
        assert_eq!(lib.name, "lib");
    }

    #[test]
    fn links_are_consistent() {
        let store = store_with(&["/", "/a", "/a/x", "/b"]);
        let ids: Vec<EntryId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(store.first(), Some(ids[0]));
        assert_eq!(store.last(), Some(ids[3]));
        for pair in ids.windows(2) {
            assert_eq!(store.next_of(pair[0]), Some(pair[1]));
            assert_eq!(store.prev_of(pair[1]), Some(pair[0]));
        }
    }

    #[test]
    fn sibling_masks_mark_continuing_branches() {
        let store = store_with(&["/", "/a", "/a/x", "/a/y", "/b"]);
        let mask = |p: &str| store.get(store.whereis(Path::new(p)).unwrap()).unwrap().sibling_mask;
        // /a/x: /a/y follows at depth 2, /b follows at depth 1.
        assert_eq!(mask("/a/x"), 0b110);
        assert_eq!(mask("/a/y"), 0b110);
        assert_eq!(mask("/b"), 0b010);
        assert_eq!(mask("/"), 0b001);
        let store = store_with(&["/", "/a", "/a/x", "/b", "/b/z"]);
        let mask = |p: &str| store.get(store.whereis(Path::new(p)).unwrap()).unwrap().sibling_mask;
        // /a/x is followed by /b: depth 2 branch ends there.
        assert_eq!(mask("/a/x") & depth_bit(2), depth_bit(2));
        assert_eq!(mask("/b") & depth_bit(2), 0);
        assert_eq!(mask("/b/z") & depth_bit(1), 0);
    }

    #[test]
    fn remove_entry_drops_subtree_and_notifies_descendants_first() {
        let mut store = store_with(&["/", "/a", "/a/x", "/a/x/deep", "/b"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        store.add_remove_hook(Box::new(move |removed| {
            log.borrow_mut().push(removed.path.to_string_lossy().to_string());
        }));
        assert!(store.remove_entry(Path::new("/a")));
        assert_eq!(paths(&store), vec!["/", "/b"]);
        assert_eq!(*seen.borrow(), vec!["/a/x", "/a/x/deep", "/a"]);
    }

    #[test]
    fn hook_sees_neighbours_at_removal_time() {
        let mut store = store_with(&["/", "/a", "/b"]);
        let root = store.whereis(Path::new("/")).unwrap();
        let b = store.whereis(Path::new("/b")).unwrap();
        let neighbours = Rc::new(Cell::new(None));
        let sink = neighbours.clone();
        store.add_remove_hook(Box::new(move |removed| {
            sink.set(Some((removed.prev, removed.next)));
        }));
        store.remove_entry(Path::new("/a"));
        assert_eq!(neighbours.get(), Some((Some(root), Some(b))));
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut store = store_with(&["/", "/a"]);
        let a = store.whereis(Path::new("/a")).unwrap();
        store.remove_entry(Path::new("/a"));
        assert!(!store.contains(a));
        let again = store.add_entry(Path::new("/a"));
        assert_ne!(a, again);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn remove_unknown_path_is_noop() {
        let mut store = store_with(&["/"]);
        assert!(!store.remove_entry(Path::new("/nope")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removed_hook_no_longer_fires() {
        let mut store = store_with(&["/", "/a"]);
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let hook = store.add_remove_hook(Box::new(move |_| c.set(c.get() + 1)));
        store.remove_remove_hook(hook);
        store.remove_entry(Path::new("/a"));
        assert_eq!(count.get(), 0);
        assert_eq!(store.hook_count(), 0);
    }

    #[test]
    fn rescan_adds_and_removes_children() {
        let scanner = FakeScanner::with(&[("/", &["a", "c"])]);
        let mut store = TreeStore::new(Box::new(scanner), None);
        store.add_entry(Path::new("/b/deep"));
        store.rescan(Path::new("/")).unwrap();
        assert_eq!(paths(&store), vec!["/", "/a", "/c"]);
    }

    #[test]
    fn rescan_subtree_walks_every_level() {
        let scanner = FakeScanner::with(&[
            ("/", &["a"]),
            ("/a", &["x", "y"]),
            ("/a/x", &["deep"]),
            ("/a/y", &[]),
            ("/a/x/deep", &[]),
        ]);
        let mut store = TreeStore::new(Box::new(scanner), None);
        store.rescan_subtree(Path::new("/a")).unwrap();
        assert_eq!(paths(&store), vec!["/", "/a", "/a/x", "/a/x/deep", "/a/y"]);
    }

    #[test]
    fn rescan_keeps_subtrees_of_surviving_children() {
        let scanner = FakeScanner::with(&[("/", &["a"])]);
        let mut store = TreeStore::new(Box::new(scanner), None);
        store.add_entry(Path::new("/a/x/y"));
        store.rescan(Path::new("/")).unwrap();
        assert_eq!(paths(&store), vec!["/", "/a", "/a/x", "/a/x/y"]);
    }

    #[test]
    fn failed_rescan_leaves_store_untouched() {
        let mut store = store_with(&["/", "/a"]);
        assert!(store.rescan(Path::new("/a")).is_err());
        assert_eq!(paths(&store), vec!["/", "/a"]);
    }

    #[test]
    fn rescan_real_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        let mut store = TreeStore::new(Box::new(crate::fs::scan::FsScanner::default()), None);
        store.rescan(dir.path()).unwrap();
        assert!(store.whereis(&dir.path().join("alpha")).is_some());
        assert!(store.whereis(&dir.path().join("beta")).is_some());
    }

    #[test]
    fn save_then_load_restores_entries() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cache").join("tree.json");

        let mut store = TreeStore::new(Box::new(FakeScanner::default()), Some(file.clone()));
        store.add_entry(Path::new("/usr/share"));
        store.add_entry(Path::new("/etc"));
        store.save().unwrap();
        assert!(!store.is_dirty());

        let mut restored = TreeStore::new(Box::new(FakeScanner::default()), Some(file));
        restored.load().unwrap();
        assert_eq!(paths(&restored), vec!["/", "/etc", "/usr", "/usr/share"]);
        assert!(!restored.is_dirty());
    }

    #[test]
    fn load_happens_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tree.json");
        fs::write(&file, r#"{"version":1,"entries":["/a"]}"#).unwrap();
        let mut store = TreeStore::new(Box::new(FakeScanner::default()), Some(file));
        store.load().unwrap();
        store.remove_entry(Path::new("/a"));
        store.load().unwrap();
        assert!(store.whereis(Path::new("/a")).is_none());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut store =
            TreeStore::new(Box::new(FakeScanner::default()), Some(dir.path().join("none.json")));
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tree.json");
        fs::write(&file, r#"{"version":9,"entries":[]}"#).unwrap();
        let mut store = TreeStore::new(Box::new(FakeScanner::default()), Some(file));
        assert!(matches!(store.load(), Err(AppError::Store(_))));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tree.json");
        fs::write(&file, "not json").unwrap();
        let mut store = TreeStore::new(Box::new(FakeScanner::default()), Some(file));
        assert!(matches!(store.load(), Err(AppError::Json(_))));
    }

    #[test]
    fn normalize_strips_dots_and_trailing_separator() {
        assert_eq!(normalize(Path::new("/a/./b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/a//b")), PathBuf::from("/a/b"));
    }
}
