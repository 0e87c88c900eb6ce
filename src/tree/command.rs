//! Tree commands and their event handlers.

use std::io;
use std::path::{Path, PathBuf};

use crate::bus::{Dispatch, EventBus, EventGroup, EventReturn, Handler};
use crate::error::CommandError;
use crate::fs::operations;
use crate::tree::{NavigationMode, TreeView};

/// Help topic shown for the tree.
pub const HELP_TOPIC: &str = "[Directory Tree]";

/// Discrete commands a tree understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeCommand {
    Help,
    Forget,
    ToggleNavigation,
    Copy,
    Move,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Rescan,
    Search,
    Rmdir,
    Chdir,
    ShowBox,
    Quit,
}

impl TreeCommand {
    /// Every command the tree knows.
    pub const ALL: [TreeCommand; 20] = [
        Self::Help,
        Self::Forget,
        Self::ToggleNavigation,
        Self::Copy,
        Self::Move,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Home,
        Self::End,
        Self::PageUp,
        Self::PageDown,
        Self::Enter,
        Self::Rescan,
        Self::Search,
        Self::Rmdir,
        Self::Chdir,
        Self::ShowBox,
        Self::Quit,
    ];

    /// Event name the command is raised under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Forget => "forget",
            Self::ToggleNavigation => "navigation_mode_toggle",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Up => "goto_up",
            Self::Down => "goto_down",
            Self::Left => "goto_left",
            Self::Right => "goto_right",
            Self::Home => "goto_home",
            Self::End => "goto_end",
            Self::PageUp => "goto_page_up",
            Self::PageDown => "goto_page_down",
            Self::Enter => "enter",
            Self::Rescan => "rescan",
            Self::Search => "search_begin",
            Self::Rmdir => "rmdir",
            Self::Chdir => "chdir",
            Self::ShowBox => "show_box",
            Self::Quit => "quit",
        }
    }

    /// Command registered under the bus event `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// One-line text for the help page.
    pub fn description(self) -> &'static str {
        match self {
            Self::Help => "Show help",
            Self::Forget => "Forget directory (remove from tree)",
            Self::ToggleNavigation => "Toggle static/dynamic navigation",
            Self::Copy => "Copy directory",
            Self::Move => "Move directory",
            Self::Up => "Previous directory",
            Self::Down => "Next directory",
            Self::Left => "Go to parent (dynamic mode)",
            Self::Right => "Go to first child (dynamic mode)",
            Self::Home => "First directory",
            Self::End => "Last directory",
            Self::PageUp => "Page up",
            Self::PageDown => "Page down",
            Self::Enter => "Change panel to directory",
            Self::Rescan => "Rescan directory",
            Self::Search => "Search / find next",
            Self::Rmdir => "Delete directory",
            Self::Chdir => "Select directory",
            Self::ShowBox => "Open directory tree box",
            Self::Quit => "Quit / close",
        }
    }
}

/// Command-specific payload carried alongside a raised event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventData {
    #[default]
    None,
    /// Directory the command applies to instead of the selection.
    Path(PathBuf),
    /// Help topic for the core help handler.
    Help(&'static str),
    /// Destination entered for copy or move.
    Destination(PathBuf),
    /// The user confirmed a destructive command.
    Confirmed,
}

/// Services the surrounding application provides to tree handlers.
pub trait Host {
    /// No further input is waiting to be processed.
    fn is_idle(&self) -> bool;
    /// Moving in the panel tree re-targets the sibling panel.
    fn auto_chdir(&self) -> bool;
    fn confirm_delete(&self) -> bool;
    fn show_help(&mut self, topic: &str);
    /// Point the sibling listing panel at `dir`.
    fn change_panel_dir(&mut self, dir: &Path) -> io::Result<()>;
    /// Ask for a copy destination; the answer comes back as
    /// [`EventData::Destination`] on the `copy` event.
    fn request_copy(&mut self, source: &Path);
    fn request_move(&mut self, source: &Path);
    /// Ask for confirmation; the answer comes back as
    /// [`EventData::Confirmed`] on the `rmdir` event.
    fn request_delete(&mut self, dir: &Path);
    fn open_tree_box(&mut self);
    fn report_error(&mut self, err: &CommandError);
}

/// Everything a handler may touch.
pub struct CommandContext<'a> {
    pub tree: &'a mut TreeView,
    pub host: &'a mut dyn Host,
    pub data: EventData,
}

impl<'a> CommandContext<'a> {
    pub fn new(tree: &'a mut TreeView, host: &'a mut dyn Host, data: EventData) -> Self {
        Self { tree, host, data }
    }
}

/// Raise `name` with `data` as payload, restoring the caller's payload after.
pub fn raise_with(
    bus: &EventBus,
    group: EventGroup,
    name: &str,
    ctx: &mut CommandContext<'_>,
    data: EventData,
    ret: &mut EventReturn,
) -> Dispatch {
    let saved = std::mem::replace(&mut ctx.data, data);
    let dispatch = bus.raise(group, name, ctx, ret);
    ctx.data = saved;
    dispatch
}

/// Handlers for every tree command that has one. `quit` is left to the
/// caller: it closes a modal tree and means nothing to a panel.
pub const TREE_HANDLERS: &[(&str, Handler)] = &[
    ("help", cmd_help),
    ("forget", cmd_forget),
    ("navigation_mode_toggle", cmd_toggle_navigation),
    ("copy", cmd_copy),
    ("move", cmd_move),
    ("goto_up", cmd_goto_up),
    ("goto_down", cmd_goto_down),
    ("goto_left", cmd_goto_left),
    ("goto_right", cmd_goto_right),
    ("goto_home", cmd_goto_home),
    ("goto_end", cmd_goto_end),
    ("goto_page_up", cmd_goto_page_up),
    ("goto_page_down", cmd_goto_page_down),
    ("enter", cmd_enter),
    ("rescan", cmd_rescan),
    ("search_begin", cmd_search_begin),
    ("rmdir", cmd_rmdir),
    ("chdir", cmd_chdir),
    ("show_box", cmd_show_box),
];

/// Register every tree command handler on the `TreeView` group.
pub fn register(bus: &mut EventBus) {
    bus.register_group(EventGroup::TreeView, TREE_HANDLERS);
}

/// When enabled, make the sibling panel follow the panel tree's selection.
pub fn maybe_chdir(bus: &EventBus, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if ctx.host.auto_chdir() && ctx.tree.is_panel() && ctx.host.is_idle() {
        let mut ret = EventReturn::None;
        if let Dispatch::Failed(err) = raise_with(
            bus,
            EventGroup::TreeView,
            TreeCommand::Enter.name(),
            ctx,
            EventData::None,
            &mut ret,
        ) {
            return Err(err);
        }
    }
    Ok(())
}

fn selected_or_payload(ctx: &CommandContext<'_>) -> Option<PathBuf> {
    match &ctx.data {
        EventData::Path(p) => Some(p.clone()),
        _ => ctx.tree.selected_path(),
    }
}

/// Shorten a path for prompts, keeping its tail.
pub fn trunc_path(path: &Path, max: usize) -> String {
    let text = path.to_string_lossy();
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max.saturating_sub(1)).collect();
    format!("~{}", tail)
}

// ── Handlers ───────────────────────────────────────────────────────

fn cmd_help(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let mut ret = EventReturn::None;
    raise_with(bus, EventGroup::Core, "help", ctx, EventData::Help(HELP_TOPIC), &mut ret)
        .into_result()
        .map(|_| ())
}

fn cmd_forget(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    if let Some(path) = selected_or_payload(ctx) {
        ctx.tree.store().borrow_mut().remove_entry(&path);
    }
    Ok(())
}

fn cmd_toggle_navigation(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let mode = ctx.tree.navigation().toggled();
    ctx.tree.set_navigation(mode);
    tracing::debug!(?mode, "navigation mode changed");
    Ok(())
}

fn cmd_copy(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let Some(source) = ctx.tree.selected_path() else {
        return Ok(());
    };
    let EventData::Destination(dest) = &ctx.data else {
        ctx.host.request_copy(&source);
        return Ok(());
    };
    if dest.as_os_str().is_empty() {
        return Ok(());
    }
    let copied = operations::copy_dir(&source, dest)
        .map_err(|e| CommandError::from_app("copy", &e))?;
    record_subtree(ctx.tree, &copied);
    Ok(())
}

fn cmd_move(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let Some(source) = ctx.tree.selected_path() else {
        return Ok(());
    };
    let EventData::Destination(dest) = &ctx.data else {
        ctx.host.request_move(&source);
        return Ok(());
    };
    if dest.as_os_str().is_empty() {
        return Ok(());
    }
    let meta = std::fs::metadata(dest).map_err(|e| {
        CommandError::new("move", format!("Cannot stat the destination\n{}", e))
    })?;
    if !meta.is_dir() {
        return Err(CommandError::new(
            "move",
            format!("Destination \"{}\" must be a directory", dest.display()),
        ));
    }
    let moved = operations::move_dir(&source, dest)
        .map_err(|e| CommandError::from_app("move", &e))?;
    ctx.tree.store().borrow_mut().remove_entry(&source);
    record_subtree(ctx.tree, &moved);
    Ok(())
}

/// Add a directory created by copy or move to the store, subdirectories
/// included. The operation itself already succeeded, so a scan failure
/// only leaves the tree incomplete.
fn record_subtree(tree: &TreeView, root: &Path) {
    let mut store = tree.store().borrow_mut();
    store.add_entry(root);
    if let Err(e) = store.rescan_subtree(root) {
        tracing::warn!(path = %root.display(), error = %e, "failed to scan new directory");
    }
}

fn cmd_goto_up(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.tree.move_backward(1);
    maybe_chdir(bus, ctx)
}

fn cmd_goto_down(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.tree.move_forward(1);
    maybe_chdir(bus, ctx)
}

fn cmd_goto_home(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.tree.move_to_top();
    maybe_chdir(bus, ctx)
}

fn cmd_goto_end(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.tree.move_to_bottom();
    maybe_chdir(bus, ctx)
}

fn cmd_goto_page_up(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let page = ctx.tree.page();
    ctx.tree.move_backward(page);
    maybe_chdir(bus, ctx)
}

fn cmd_goto_page_down(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let page = ctx.tree.page();
    ctx.tree.move_forward(page);
    maybe_chdir(bus, ctx)
}

/// Parent in hierarchical mode; not handled in flat mode.
fn cmd_goto_left(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    ret: &mut EventReturn,
) -> Result<(), CommandError> {
    *ret = EventReturn::Bool(false);
    if ctx.tree.navigation() == NavigationMode::Hierarchical {
        let moved = ctx.tree.move_to_parent();
        *ret = EventReturn::Bool(moved);
        maybe_chdir(bus, ctx)?;
    }
    Ok(())
}

/// First child in hierarchical mode; not handled in flat mode.
fn cmd_goto_right(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    ret: &mut EventReturn,
) -> Result<(), CommandError> {
    *ret = EventReturn::Bool(false);
    if ctx.tree.navigation() == NavigationMode::Hierarchical {
        *ret = EventReturn::Bool(true);
        let result = ctx.tree.move_to_child();
        maybe_chdir(bus, ctx)?;
        result.map_err(|e| CommandError::from_app("tree", &e))?;
    }
    Ok(())
}

fn cmd_enter(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let Some(path) = ctx.tree.selected_path() else {
        return Ok(());
    };
    if ctx.tree.is_panel() {
        ctx.host.change_panel_dir(&path).map_err(|e| {
            CommandError::new(
                "chdir",
                format!("Cannot chdir to \"{}\"\n{}", path.display(), e),
            )
        })
    } else {
        *ret = EventReturn::Text(path.to_string_lossy().to_string());
        Ok(())
    }
}

fn cmd_rescan(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.tree
        .rescan()
        .map_err(|e| CommandError::from_app("rescan", &e))
}

/// Start searching, or jump to the next match when already searching.
fn cmd_search_begin(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    if ctx.tree.is_searching() {
        ctx.tree.search_next();
    } else {
        ctx.tree.start_search();
    }
    Ok(())
}

fn cmd_rmdir(
    bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    let Some(path) = ctx.tree.selected_path() else {
        return Ok(());
    };
    let confirmed = ctx.data == EventData::Confirmed || !ctx.host.confirm_delete();
    if !confirmed {
        ctx.host.request_delete(&path);
        return Ok(());
    }
    operations::erase_dir(&path).map_err(|e| CommandError::from_app("rmdir", &e))?;
    let mut ret = EventReturn::None;
    raise_with(
        bus,
        EventGroup::TreeView,
        TreeCommand::Forget.name(),
        ctx,
        EventData::Path(path),
        &mut ret,
    )
    .into_result()
    .map(|_| ())
}

/// Follow a directory change made elsewhere. Unknown directories leave the
/// selection alone.
fn cmd_chdir(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    if let EventData::Path(dir) = &ctx.data {
        let dir = dir.clone();
        ctx.tree.select_path(&dir);
    }
    Ok(())
}

fn cmd_show_box(
    _bus: &EventBus,
    ctx: &mut CommandContext<'_>,
    _ret: &mut EventReturn,
) -> Result<(), CommandError> {
    ctx.host.open_tree_box();
    Ok(())
}
