use std::io;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;

use crate::bus::{Dispatch, EventBus, EventGroup, EventReturn};
use crate::config::AppConfig;
use crate::error::{AppError, CommandError, Result};
use crate::fs::listing::DirListing;
use crate::fs::scan::FsScanner;
use crate::fs::store::{StoreHandle, TreeStore};
use crate::fs::watcher;
use crate::handler::ClickTracker;
use crate::keymap::TreeKeymap;
use crate::theme::{resolve_theme, ThemeColors};
use crate::tree::command::{self, CommandContext, EventData, Host, TreeCommand};
use crate::tree::{shared_navigation, SharedNavigation, TreeView};

/// Which panel receives keys when no overlay is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Listing,
}

/// One of the two tree views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeTarget {
    #[default]
    Panel,
    Box,
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CopyTo { source: PathBuf },
    MoveTo { source: PathBuf },
    DeleteConfirm { dir: PathBuf },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
    Help { topic: String, scroll: usize },
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset of the cursor in `input`.
    pub cursor_position: usize,
}

impl DialogState {
    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char(&mut self) {
        if let Some(prev) = self.input[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
            self.input.remove(self.cursor_position);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.input[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.input[self.cursor_position..].chars().next() {
            self.cursor_position += next.len_utf8();
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input.len();
    }
}

/// Everything tree handlers may ask of the application.
pub struct Shell {
    pub listing: DirListing,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    /// Tree the open dialog answers to.
    pub dialog_target: TreeTarget,
    current_target: TreeTarget,
    box_requested: bool,
    /// Set by the event loop while more input is queued.
    pub input_pending: bool,
    pub auto_chdir: bool,
    pub confirm_delete: bool,
    pub should_quit: bool,
}

impl Shell {
    fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        self.dialog_target = self.current_target;
        self.mode = AppMode::Dialog(kind);
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }
}

impl Host for Shell {
    fn is_idle(&self) -> bool {
        !self.input_pending
    }

    fn auto_chdir(&self) -> bool {
        self.auto_chdir
    }

    fn confirm_delete(&self) -> bool {
        self.confirm_delete
    }

    fn show_help(&mut self, topic: &str) {
        self.mode = AppMode::Help {
            topic: topic.to_string(),
            scroll: 0,
        };
    }

    fn change_panel_dir(&mut self, dir: &Path) -> io::Result<()> {
        self.listing.change_dir(dir).map_err(|e| match e {
            AppError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        })
    }

    fn request_copy(&mut self, source: &Path) {
        self.open_dialog(DialogKind::CopyTo {
            source: source.to_path_buf(),
        });
    }

    fn request_move(&mut self, source: &Path) {
        self.open_dialog(DialogKind::MoveTo {
            source: source.to_path_buf(),
        });
    }

    fn request_delete(&mut self, dir: &Path) {
        self.open_dialog(DialogKind::DeleteConfirm {
            dir: dir.to_path_buf(),
        });
    }

    fn open_tree_box(&mut self) {
        self.box_requested = true;
    }

    fn report_error(&mut self, err: &CommandError) {
        tracing::warn!(domain = err.domain, message = %err.message, "command failed");
        self.open_dialog(DialogKind::Error {
            message: err.message.clone(),
        });
    }
}

/// Show the help page for the topic a command raised.
fn core_help(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> std::result::Result<(), CommandError> {
    if let EventData::Help(topic) = ctx.data {
        ctx.host.show_help(topic);
    }
    Ok(())
}

/// Main application state.
pub struct App {
    pub bus: EventBus,
    pub store: StoreHandle,
    pub navigation: SharedNavigation,
    /// Declared before `panel` so it is dropped first; the last view
    /// dropped saves the store.
    pub tree_box: Option<TreeView>,
    pub panel: TreeView,
    pub shell: Shell,
    pub keymap: TreeKeymap,
    pub theme: ThemeColors,
    pub focus: Focus,
    pub show_mini_info: bool,
    pub clicks: ClickTracker,
    pub listing_area: Rect,
    pub buttonbar_area: Rect,
    /// Root the filesystem watcher reports changes under.
    pub watch_root: PathBuf,
}

impl App {
    /// Open the tree store and point both panels at `start`.
    pub fn new(config: &AppConfig, start: &Path) -> Result<Self> {
        let scanner = FsScanner::new(config.show_hidden());
        let store = TreeStore::new(Box::new(scanner), config.tree_file()).into_handle();
        let navigation = shared_navigation(config.navigation());
        let mut panel = TreeView::new(store.clone(), navigation.clone(), true);
        seed_store(&store, start);
        panel.set_active(true);

        let mut bus = EventBus::new();
        command::register(&mut bus);
        bus.register(EventGroup::Core, "help", core_help);

        let shell = Shell {
            listing: DirListing::new(start, config.show_hidden())?,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            dialog_target: TreeTarget::Panel,
            current_target: TreeTarget::Panel,
            box_requested: false,
            input_pending: false,
            auto_chdir: config.auto_chdir(),
            confirm_delete: config.confirm_delete(),
            should_quit: false,
        };

        let mut app = Self {
            bus,
            store,
            navigation,
            tree_box: None,
            panel,
            shell,
            keymap: TreeKeymap::with_overrides(&config.keys),
            theme: resolve_theme(&config.theme),
            focus: Focus::Tree,
            show_mini_info: config.show_mini_info(),
            clicks: ClickTracker::default(),
            listing_area: Rect::default(),
            buttonbar_area: Rect::default(),
            watch_root: start.to_path_buf(),
        };
        app.dispatch(
            TreeTarget::Panel,
            TreeCommand::Chdir.name(),
            EventData::Path(start.to_path_buf()),
        );
        Ok(app)
    }

    pub fn quit(&mut self) {
        self.shell.should_quit = true;
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.panel.set_active(focus == Focus::Tree);
    }

    pub fn tree_mut(&mut self, target: TreeTarget) -> Option<&mut TreeView> {
        match target {
            TreeTarget::Panel => Some(&mut self.panel),
            TreeTarget::Box => self.tree_box.as_mut(),
        }
    }

    /// The tree that owns keyboard input: the box when open, else the panel.
    pub fn focused_tree(&self) -> TreeTarget {
        if self.tree_box.is_some() {
            TreeTarget::Box
        } else {
            TreeTarget::Panel
        }
    }

    /// Raise `name` on the chosen tree. A handler failure is shown in an
    /// error dialog.
    pub fn dispatch(
        &mut self,
        target: TreeTarget,
        name: &str,
        data: EventData,
    ) -> (Dispatch, EventReturn) {
        let tree = match target {
            TreeTarget::Panel => &mut self.panel,
            TreeTarget::Box => match self.tree_box.as_mut() {
                Some(tree) => tree,
                None => return (Dispatch::NotHandled, EventReturn::None),
            },
        };
        self.shell.current_target = target;
        let mut ret = EventReturn::None;
        let dispatch = {
            let mut ctx = CommandContext::new(tree, &mut self.shell, data);
            self.bus.raise(EventGroup::TreeView, name, &mut ctx, &mut ret)
        };
        if let Some(err) = dispatch.error() {
            self.shell.report_error(err);
        }
        if std::mem::take(&mut self.shell.box_requested) {
            self.open_tree_box();
        }
        (dispatch, ret)
    }

    /// Run `maybe_chdir` for a tree outside of any command, after a search
    /// keystroke moved its selection.
    pub fn follow_selection(&mut self, target: TreeTarget) {
        let Some(tree) = (match target {
            TreeTarget::Panel => Some(&mut self.panel),
            TreeTarget::Box => self.tree_box.as_mut(),
        }) else {
            return;
        };
        self.shell.current_target = target;
        let result = {
            let mut ctx = CommandContext::new(tree, &mut self.shell, EventData::None);
            command::maybe_chdir(&self.bus, &mut ctx)
        };
        if let Err(err) = result {
            self.shell.report_error(&err);
        }
    }

    // ── Tree box ───────────────────────────────────────────────────

    /// Open the modal tree box on the panel tree's selection.
    pub fn open_tree_box(&mut self) {
        if self.tree_box.is_some() {
            return;
        }
        let mut view = TreeView::new(self.store.clone(), self.navigation.clone(), false);
        if let Some(path) = self.panel.selected_path() {
            view.select_path(&path);
        }
        self.tree_box = Some(view);
    }

    pub fn close_tree_box(&mut self) {
        self.tree_box = None;
    }

    /// The box returned a directory: close it and move both panels there.
    pub fn accept_box_result(&mut self, dir: &Path) {
        self.close_tree_box();
        self.change_listing_dir(dir);
    }

    // ── Listing ────────────────────────────────────────────────────

    /// Point the listing at `dir` and let the panel tree follow.
    pub fn change_listing_dir(&mut self, dir: &Path) {
        match self.shell.listing.change_dir(dir) {
            Ok(()) => self.listing_changed(),
            Err(e) => self.shell.report_error(&CommandError::new(
                "chdir",
                format!("Cannot chdir to \"{}\"\n{}", dir.display(), e),
            )),
        }
    }

    /// Tell the panel tree the listing now shows a different directory.
    pub fn listing_changed(&mut self) {
        let dir = self.shell.listing.dir.clone();
        seed_store(&self.store, &dir);
        self.dispatch(
            TreeTarget::Panel,
            TreeCommand::Chdir.name(),
            EventData::Path(dir),
        );
    }

    /// Re-read the listing. When its directory is gone, fall back to the
    /// nearest ancestor that can still be read.
    pub fn refresh_listing(&mut self) {
        if self.shell.listing.reload().is_ok() {
            return;
        }
        let dir = self.shell.listing.dir.clone();
        for ancestor in dir.ancestors().skip(1) {
            if self.shell.listing.change_dir(ancestor).is_ok() {
                self.listing_changed();
                return;
            }
        }
    }

    // ── Dialog answers ─────────────────────────────────────────────

    /// Confirm the open dialog and hand its answer back to the tree.
    pub fn submit_dialog(&mut self) {
        let AppMode::Dialog(kind) = self.shell.mode.clone() else {
            return;
        };
        let input = self.shell.dialog_state.input.trim().to_string();
        let target = self.shell.dialog_target;
        self.shell.close_dialog();

        let (name, data) = match kind {
            DialogKind::CopyTo { .. } | DialogKind::MoveTo { .. } if input.is_empty() => return,
            DialogKind::CopyTo { .. } => (
                TreeCommand::Copy.name(),
                EventData::Destination(self.resolve_input(&input)),
            ),
            DialogKind::MoveTo { .. } => (
                TreeCommand::Move.name(),
                EventData::Destination(self.resolve_input(&input)),
            ),
            DialogKind::DeleteConfirm { .. } => (TreeCommand::Rmdir.name(), EventData::Confirmed),
            DialogKind::Error { .. } => return,
        };
        self.dispatch(target, name, data);
        self.refresh_listing();
    }

    /// Relative destinations are taken from the listing's directory.
    fn resolve_input(&self, input: &str) -> PathBuf {
        let path = PathBuf::from(input);
        if path.is_relative() {
            self.shell.listing.dir.join(path)
        } else {
            path
        }
    }

    // ── Filesystem watcher ─────────────────────────────────────────

    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        let changed = {
            let mut store = self.store.borrow_mut();
            watcher::sync_store(&mut store, &paths, &self.watch_root)
        };
        if changed {
            tracing::debug!(count = paths.len(), "tree store updated from watcher");
        }
        let listing_dir = self.shell.listing.dir.clone();
        let touches_listing = paths
            .iter()
            .any(|p| p.parent() == Some(listing_dir.as_path()) || listing_dir.starts_with(p));
        if touches_listing {
            self.refresh_listing();
        }
    }
}

/// Make sure `dir` is in the store, scanning it the first time it is seen.
fn seed_store(store: &StoreHandle, dir: &Path) {
    let mut store = store.borrow_mut();
    if store.whereis(dir).is_some() {
        return;
    }
    store.add_entry(dir);
    if let Err(e) = store.rescan(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "initial scan failed");
    }
}
