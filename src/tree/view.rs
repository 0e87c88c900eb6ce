use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ratatui::layout::Rect;

use crate::error::Result;
use crate::fs::store::{DirEntry, EntryId, HookId, StoreHandle, TreeStore};
use crate::tree::search::SearchState;
use crate::tree::{NavigationMode, SharedNavigation};

/// Rows kept between the selection and either edge of the viewport.
pub const FOCUS_MARGIN: usize = 3;

/// One view over the shared tree store.
///
/// The selection lives in a cell shared with the removal hook registered
/// on the store, so deleting the selected record from anywhere reseats it
/// before the view looks at it again.
pub struct TreeView {
    store: StoreHandle,
    navigation: SharedNavigation,
    selected: Rc<Cell<Option<EntryId>>>,
    hook: Option<HookId>,
    /// Rows between the top visible row and the selection.
    pub(crate) scroll_offset: usize,
    lines: usize,
    shown: Vec<EntryId>,
    pub(crate) search: SearchState,
    is_panel: bool,
    active: bool,
    area: Rect,
}

impl TreeView {
    /// Bind a view to `store`, loading the store on first use.
    pub fn new(store: StoreHandle, navigation: SharedNavigation, is_panel: bool) -> Self {
        let selected = Rc::new(Cell::new(None));
        let hook = {
            let mut s = store.borrow_mut();
            if let Err(e) = s.load() {
                tracing::warn!(error = %e, "failed to load directory tree");
            }
            selected.set(s.first());
            let slot = Rc::downgrade(&selected);
            s.add_remove_hook(Box::new(move |removed| {
                let Some(slot) = slot.upgrade() else {
                    return;
                };
                if slot.get() == Some(removed.id) {
                    slot.set(removed.next.or(removed.prev));
                }
            }))
        };
        Self {
            store,
            navigation,
            selected,
            hook: Some(hook),
            scroll_offset: 0,
            lines: 0,
            shown: Vec::new(),
            search: SearchState::default(),
            is_panel,
            active: !is_panel,
            area: Rect::default(),
        }
    }

    // ── State accessors ────────────────────────────────────────────

    /// Store this view reads from.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Selected record, if any. May name a removed record until the next
    /// movement or layout reseats it.
    pub fn selected(&self) -> Option<EntryId> {
        self.selected.get()
    }

    /// Replace the selection without touching the scroll offset.
    pub(crate) fn set_selected(&mut self, id: Option<EntryId>) {
        self.selected.set(id);
    }

    /// Full path of the selected record.
    pub fn selected_path(&self) -> Option<PathBuf> {
        let id = self.selected.get()?;
        self.store.borrow().path_of(id).map(Path::to_path_buf)
    }

    /// Current mode; shared with every other view.
    pub fn navigation(&self) -> NavigationMode {
        self.navigation.get()
    }

    /// Switch the mode for all views at once.
    pub fn set_navigation(&self, mode: NavigationMode) {
        self.navigation.set(mode);
    }

    /// True for the embedded panel, false for the modal box.
    pub fn is_panel(&self) -> bool {
        self.is_panel
    }

    /// Whether the view has keyboard focus.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Focus or unfocus the view. Losing focus ends any search.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.stop_search();
        }
    }

    /// Tree rows available on the last layout.
    pub fn visible_rows(&self) -> usize {
        self.lines
    }

    /// Set the row count ahead of a layout, for callers that move the
    /// selection before anything is drawn.
    pub fn set_visible_rows(&mut self, lines: usize) {
        self.lines = lines;
    }

    /// Screen area of the last render, borders included.
    pub fn area(&self) -> Rect {
        self.area
    }

    pub(crate) fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Records drawn on the last render, top to bottom.
    pub fn shown(&self) -> &[EntryId] {
        &self.shown
    }

    /// Record drawn on `row` during the last render, if still present.
    pub fn entry_at_row(&self, row: usize) -> Option<EntryId> {
        let id = *self.shown.get(row)?;
        self.store.borrow().contains(id).then_some(id)
    }

    /// Select the first record when nothing valid is selected.
    fn ensure_selection(&mut self) -> Option<EntryId> {
        let store = self.store.borrow();
        match self.selected.get() {
            Some(id) if store.contains(id) => Some(id),
            _ => {
                let first = store.first();
                self.selected.set(first);
                self.scroll_offset = 0;
                first
            }
        }
    }

    // ── Movement ───────────────────────────────────────────────────

    /// Keep the selection at least [`FOCUS_MARGIN`] rows from both edges.
    pub fn focus_correction(&mut self) {
        let hi = self.lines.saturating_sub(FOCUS_MARGIN + 1);
        let lo = FOCUS_MARGIN.min(hi);
        self.scroll_offset = self.scroll_offset.clamp(lo, hi);
    }

    /// Move up to `steps` records back. Returns how many were taken.
    pub fn move_backward(&mut self, steps: usize) -> usize {
        self.move_backward_with(steps, self.navigation.get())
    }

    /// Move up to `steps` records forward. Returns how many were taken.
    pub fn move_forward(&mut self, steps: usize) -> usize {
        self.move_forward_with(steps, self.navigation.get())
    }

    /// [`Self::move_backward`] with an explicit adjacency rule.
    pub(crate) fn move_backward_with(&mut self, steps: usize, mode: NavigationMode) -> usize {
        let Some(start) = self.ensure_selection() else {
            return 0;
        };
        let (target, taken) = {
            let store = self.store.borrow();
            walk(&store, start, steps, mode, |s, id| s.prev_of(id))
        };
        self.selected.set(Some(target));
        self.scroll_offset = self.scroll_offset.saturating_sub(taken);
        self.focus_correction();
        taken
    }

    /// [`Self::move_forward`] with an explicit adjacency rule.
    pub(crate) fn move_forward_with(&mut self, steps: usize, mode: NavigationMode) -> usize {
        let Some(start) = self.ensure_selection() else {
            return 0;
        };
        let (target, taken) = {
            let store = self.store.borrow();
            walk(&store, start, steps, mode, |s, id| s.next_of(id))
        };
        self.selected.set(Some(target));
        self.scroll_offset += taken;
        self.focus_correction();
        taken
    }

    /// Select the nearest preceding record that is shallower than the
    /// selection, or the first record if there is none. Returns whether the
    /// selection changed.
    pub fn move_to_parent(&mut self) -> bool {
        let Some(start) = self.ensure_selection() else {
            return false;
        };
        let target = {
            let store = self.store.borrow();
            let depth = store.depth_of(start).unwrap_or(0);
            let mut current = store.prev_of(start);
            self.scroll_offset = self.scroll_offset.saturating_sub(1);
            while let Some(id) = current {
                if store.depth_of(id).unwrap_or(0) < depth {
                    break;
                }
                current = store.prev_of(id);
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            current.or(store.first())
        };
        self.selected.set(target);
        self.focus_correction();
        target != Some(start)
    }

    /// Select the first child of the selection. When the store knows no
    /// children, rescan the selected directory once and try again.
    pub fn move_to_child(&mut self) -> Result<bool> {
        let Some(start) = self.ensure_selection() else {
            return Ok(false);
        };
        if self.step_into_child(start) {
            return Ok(true);
        }
        let Some(path) = self.selected_path() else {
            return Ok(false);
        };
        self.store.borrow_mut().rescan(&path)?;
        Ok(self.step_into_child(start))
    }

    fn step_into_child(&mut self, start: EntryId) -> bool {
        let child = {
            let store = self.store.borrow();
            let depth = store.depth_of(start);
            store
                .next_of(start)
                .filter(|next| store.depth_of(*next).zip(depth).is_some_and(|(n, d)| n == d + 1))
        };
        match child {
            Some(id) => {
                self.selected.set(Some(id));
                self.scroll_offset += 1;
                self.focus_correction();
                true
            }
            None => false,
        }
    }

    /// Select the first record and put it on the top row.
    pub fn move_to_top(&mut self) {
        let first = self.store.borrow().first();
        self.selected.set(first);
        self.scroll_offset = 0;
    }

    /// Select the last record, keeping the bottom margin below it.
    pub fn move_to_bottom(&mut self) {
        let last = self.store.borrow().last();
        self.selected.set(last);
        self.scroll_offset = self.lines.saturating_sub(FOCUS_MARGIN + 1);
    }

    /// Page size used by page up/down and clicks outside the rows.
    pub fn page(&self) -> usize {
        self.lines.saturating_sub(1).max(1)
    }

    /// Select `path` if the store knows it. An unknown path keeps the
    /// current selection.
    pub fn select_path(&mut self, path: &Path) -> bool {
        let Some(id) = self.store.borrow().whereis(path) else {
            return false;
        };
        self.selected.set(Some(id));
        self.focus_correction();
        true
    }

    /// Select the record drawn on `row`, keeping it on that row.
    pub fn select_row(&mut self, row: usize) -> bool {
        match self.entry_at_row(row) {
            Some(id) => {
                self.selected.set(Some(id));
                self.scroll_offset = row;
                true
            }
            None => false,
        }
    }

    // ── Store operations ───────────────────────────────────────────

    /// Rescan the selected directory.
    pub fn rescan(&mut self) -> Result<()> {
        match self.selected_path() {
            Some(path) => self.store.borrow_mut().rescan(&path),
            None => Ok(()),
        }
    }

    /// Drop the selected record (and its subtree) from the store.
    pub fn forget(&mut self) -> bool {
        match self.selected_path() {
            Some(path) => self.store.borrow_mut().remove_entry(&path),
            None => false,
        }
    }

    // ── Layout ─────────────────────────────────────────────────────

    /// Decide which records fill `rows` rows, top to bottom.
    ///
    /// The top row is found by walking `scroll_offset` visible records back
    /// from the selection; when the sequence start is reached first, the
    /// offset is corrected to the distance actually walked.
    ///
    /// A change in row count re-applies focus correction first, so a
    /// selection made before the first render still lands inside the
    /// margins.
    pub fn layout(&mut self, rows: usize) -> &[EntryId] {
        if rows != self.lines {
            self.lines = rows;
            self.focus_correction();
        }
        self.shown.clear();
        let Some(selected) = self.ensure_selection() else {
            return &self.shown;
        };
        let store = self.store.borrow();
        let Some(sel) = store.get(selected) else {
            return &self.shown;
        };
        let mode = self.navigation.get();

        let mut top = selected;
        let mut walked = 0;
        while walked < self.scroll_offset {
            let Some(prev) = store.prev_of(top) else {
                break;
            };
            top = prev;
            if store.get(prev).is_some_and(|e| is_visible(mode, sel, e)) {
                walked += 1;
            }
        }
        self.scroll_offset = walked;

        let mut current = Some(top);
        while self.shown.len() < rows {
            let Some(id) = current else {
                break;
            };
            self.shown.push(id);
            current = store.next_of(id);
            while let Some(next) = current {
                if store.get(next).is_some_and(|e| is_visible(mode, sel, e)) {
                    break;
                }
                current = store.next_of(next);
            }
        }
        &self.shown
    }
}

impl Drop for TreeView {
    fn drop(&mut self) {
        let Ok(mut store) = self.store.try_borrow_mut() else {
            tracing::warn!(
                "tree store busy while dropping a view; \
                 its removal hook stays registered and the tree is not saved"
            );
            return;
        };
        if let Some(hook) = self.hook.take() {
            store.remove_remove_hook(hook);
        }
        if store.hook_count() == 0 {
            if let Err(e) = store.save() {
                tracing::warn!(error = %e, "failed to save directory tree");
            }
        }
        self.shown.clear();
    }
}

/// Walk up to `steps` records from `start` using `link`. In hierarchical
/// mode only records at the start's depth count, and the walk stops at the
/// first shallower record.
fn walk(
    store: &TreeStore,
    start: EntryId,
    steps: usize,
    mode: NavigationMode,
    link: impl Fn(&TreeStore, EntryId) -> Option<EntryId>,
) -> (EntryId, usize) {
    let mut selected = start;
    let mut taken = 0;
    match mode {
        NavigationMode::Flat => {
            while taken < steps {
                let Some(id) = link(store, selected) else {
                    break;
                };
                selected = id;
                taken += 1;
            }
        }
        NavigationMode::Hierarchical => {
            let depth = store.depth_of(start).unwrap_or(0);
            let mut current = start;
            while taken < steps {
                let Some(id) = link(store, current) else {
                    break;
                };
                let Some(d) = store.depth_of(id) else {
                    break;
                };
                if d < depth {
                    break;
                }
                current = id;
                if d == depth {
                    selected = id;
                    taken += 1;
                }
            }
        }
    }
    (selected, taken)
}

/// Whether `entry` is drawn while `sel` is selected.
fn is_visible(mode: NavigationMode, sel: &DirEntry, entry: &DirEntry) -> bool {
    if mode == NavigationMode::Flat {
        return true;
    }
    if entry.depth < sel.depth {
        sel.path.starts_with(&entry.path)
    } else if entry.depth == sel.depth {
        entry.path.parent() == sel.path.parent()
    } else if entry.depth == sel.depth + 1 {
        entry.path.parent() == Some(sel.path.as_path())
    } else {
        false
    }
}
