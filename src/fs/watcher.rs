use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;
use crate::fs::store::TreeStore;

/// Directory names whose contents are never reported.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    ".mypy_cache",
    "target",
];

/// Events per debounce window above which the batch collapses to the root.
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Filesystem watcher that monitors a root directory and sends change events.
pub struct FsWatcher {
    /// Dropping the debouncer stops watching.
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Watch `root` recursively, sending debounced batches of changed paths
    /// through `event_tx`. Batches larger than `flood_threshold` are sent as
    /// the root path alone.
    pub fn new(
        root: &Path,
        debounce_duration: Duration,
        ignore_patterns: Vec<String>,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let root_path = root.to_path_buf();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p, &ignore_patterns))
                            .collect();

                        if paths.is_empty() {
                            return;
                        }

                        let final_paths = if paths.len() > flood_threshold {
                            vec![root_path.clone()]
                        } else {
                            paths
                        };

                        let _ = event_tx.send(Event::FsChange(final_paths));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "filesystem watcher error");
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "watching filesystem");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Whether any component of `path` equals one of `patterns`.
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            patterns.iter().any(|p| name == p.as_str())
        }
        _ => false,
    })
}

/// Bring `store` in line with a batch of changed paths.
///
/// Known directories that vanished are removed (with their subtrees), new
/// directories under a known parent are added unless a rescan would skip
/// them (hidden names), and a known directory that
/// still exists is rescanned when it is the flood root. Returns whether the
/// store changed.
pub fn sync_store(store: &mut TreeStore, paths: &[PathBuf], root: &Path) -> bool {
    let mut changed = false;
    for path in paths {
        let exists_as_dir = std::fs::symlink_metadata(path)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let known = store.whereis(path).is_some();

        if !exists_as_dir {
            if known {
                tracing::debug!(path = %path.display(), "directory vanished");
                changed |= store.remove_entry(path);
            }
            continue;
        }

        if path == root && known {
            match store.rescan(path) {
                Ok(()) => changed = true,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "rescan failed"),
            }
            continue;
        }

        let parent_known = path
            .parent()
            .is_some_and(|parent| store.whereis(parent).is_some());
        if !known && parent_known && store.admits(path) {
            tracing::debug!(path = %path.display(), "directory appeared");
            store.add_entry(path);
            changed = true;
        }
    }
    changed
}
