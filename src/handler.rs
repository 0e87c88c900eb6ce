use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, AppMode, DialogKind, Focus, TreeTarget};
use crate::bus::EventReturn;
use crate::components::button_bar::button_at;
use crate::components::help::HelpOverlay;
use crate::components::listing::entry_at;
use crate::error::CommandError;
use crate::tree::command::{EventData, Host, TreeCommand};
use crate::tree::search::SearchKey;

/// Two releases at the same cell within this window count as a double click.
pub const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Remembers the last click to recognise double clicks.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(Instant, u16, u16)>,
}

impl ClickTracker {
    /// Record a click; returns whether it completes a double click.
    pub fn register(&mut self, x: u16, y: u16, now: Instant) -> bool {
        let double = self.last.is_some_and(|(at, lx, ly)| {
            lx == x && ly == y && now.saturating_duration_since(at) <= DOUBLE_CLICK
        });
        self.last = if double { None } else { Some((now, x, y)) };
        double
    }
}

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.shell.mode {
        AppMode::Dialog(_) => return handle_dialog_key(app, key),
        AppMode::Help { .. } => return handle_help_key(app, key),
        AppMode::Normal => {}
    }

    if app.tree_box.is_some() {
        let handled = handle_tree_key(app, TreeTarget::Box, key);
        if !handled && key.code == KeyCode::Esc {
            app.close_tree_box();
        }
        return;
    }

    if key.code == KeyCode::Tab {
        let next = match app.focus {
            Focus::Tree => Focus::Listing,
            Focus::Listing => Focus::Tree,
        };
        app.set_focus(next);
        return;
    }

    match app.focus {
        Focus::Tree => {
            if !handle_tree_key(app, TreeTarget::Panel, key)
                && app.keymap.lookup(&key) == Some(TreeCommand::Quit)
            {
                app.quit();
            }
        }
        Focus::Listing => handle_listing_key(app, key),
    }
}

/// Characters the search line accepts.
fn search_key(key: &KeyEvent) -> Option<SearchKey> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(SearchKey::Char(c))
        }
        KeyCode::Backspace => Some(SearchKey::Backspace),
        _ => None,
    }
}

/// Feed a key to one tree. Returns whether the tree consumed it.
pub fn handle_tree_key(app: &mut App, target: TreeTarget, key: KeyEvent) -> bool {
    let Some(tree) = app.tree_mut(target) else {
        return false;
    };

    if key.code == KeyCode::Esc {
        // A modal tree leaves the abort key to its owner, which closes it.
        if !tree.is_panel() {
            return false;
        }
        tree.stop_search();
        return true;
    }

    if tree.is_searching() {
        if let Some(search) = search_key(&key) {
            tree.search_input(search);
            app.follow_selection(target);
            return true;
        }
    }

    if let Some(cmd) = app.keymap.lookup(&key) {
        if execute_tree_command(app, target, cmd) {
            return true;
        }
    }

    match search_key(&key) {
        Some(search) => {
            let Some(tree) = app.tree_mut(target) else {
                return false;
            };
            tree.start_search();
            tree.search_input(search);
            app.follow_selection(target);
            true
        }
        None => false,
    }
}

/// Run `cmd` on a tree. Returns whether it was handled.
pub fn execute_tree_command(app: &mut App, target: TreeTarget, cmd: TreeCommand) -> bool {
    let Some(tree) = app.tree_mut(target) else {
        return false;
    };
    if cmd != TreeCommand::Search {
        tree.stop_search();
    }

    if cmd == TreeCommand::Quit {
        if target == TreeTarget::Box {
            app.close_tree_box();
            return true;
        }
        return false;
    }

    let (dispatch, ret) = app.dispatch(target, cmd.name(), EventData::None);
    if target == TreeTarget::Box && cmd == TreeCommand::Enter {
        if let EventReturn::Text(path) = &ret {
            app.accept_box_result(Path::new(path));
        }
    }
    dispatch.handled() && ret != EventReturn::Bool(false)
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let AppMode::Dialog(kind) = &app.shell.mode else {
        return;
    };
    match kind.clone() {
        DialogKind::Error { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.shell.close_dialog();
            }
        }
        DialogKind::DeleteConfirm { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.submit_dialog(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.shell.close_dialog(),
            _ => {}
        },
        DialogKind::CopyTo { .. } | DialogKind::MoveTo { .. } => match key.code {
            KeyCode::Enter => app.submit_dialog(),
            KeyCode::Esc => app.shell.close_dialog(),
            KeyCode::Backspace => app.shell.dialog_state.delete_char(),
            KeyCode::Left => app.shell.dialog_state.move_cursor_left(),
            KeyCode::Right => app.shell.dialog_state.move_cursor_right(),
            KeyCode::Home => app.shell.dialog_state.cursor_home(),
            KeyCode::End => app.shell.dialog_state.cursor_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.shell.dialog_state.insert_char(c)
            }
            _ => {}
        },
    }
}

fn handle_help_key(app: &mut App, key: KeyEvent) {
    let AppMode::Help { topic, scroll } = &app.shell.mode else {
        return;
    };
    let scroll = *scroll;
    let total = HelpOverlay::new(&app.theme, &app.keymap, topic, 0).total_lines();
    let max = total.saturating_sub(1);
    let scroll = match key.code {
        KeyCode::Esc | KeyCode::F(10) | KeyCode::F(1) | KeyCode::Char('q') => {
            app.shell.mode = AppMode::Normal;
            return;
        }
        KeyCode::Up | KeyCode::Char('k') => scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => (scroll + 1).min(max),
        KeyCode::PageUp => scroll.saturating_sub(10),
        KeyCode::PageDown => (scroll + 10).min(max),
        KeyCode::Home => 0,
        KeyCode::End => max,
        _ => scroll,
    };
    if let AppMode::Help { scroll: current, .. } = &mut app.shell.mode {
        *current = scroll;
    }
}

fn handle_listing_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.shell.listing.select_previous(),
        KeyCode::Down => app.shell.listing.select_next(),
        KeyCode::Home => app.shell.listing.select_first(),
        KeyCode::End => app.shell.listing.select_last(),
        KeyCode::Enter | KeyCode::Right => listing_enter(app),
        KeyCode::Backspace | KeyCode::Left => listing_parent(app),
        _ => match app.keymap.lookup(&key) {
            Some(TreeCommand::Quit) => app.quit(),
            Some(TreeCommand::Help) => {
                app.dispatch(TreeTarget::Panel, TreeCommand::Help.name(), EventData::None);
            }
            Some(TreeCommand::ShowBox) => app.open_tree_box(),
            _ => {}
        },
    }
}

fn listing_enter(app: &mut App) {
    match app.shell.listing.enter_selected() {
        Ok(Some(_)) => app.listing_changed(),
        Ok(None) => {}
        Err(e) => app
            .shell
            .report_error(&CommandError::from_app("chdir", &e)),
    }
}

fn listing_parent(app: &mut App) {
    match app.shell.listing.go_parent() {
        Ok(Some(_)) => app.listing_changed(),
        Ok(None) => {}
        Err(e) => app
            .shell
            .report_error(&CommandError::from_app("chdir", &e)),
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    area.contains(Position::new(x, y))
}

/// Tree under the pointer, if any. While the box is open nothing else is.
fn tree_at(app: &App, x: u16, y: u16) -> Option<TreeTarget> {
    match &app.tree_box {
        Some(tree_box) => contains(tree_box.area(), x, y).then_some(TreeTarget::Box),
        None => contains(app.panel.area(), x, y).then_some(TreeTarget::Panel),
    }
}

/// Handle a mouse event. Of the button events only left-button releases act.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.shell.mode != AppMode::Normal {
        return;
    }
    let (x, y) = (mouse.column, mouse.row);
    let wheel = match mouse.kind {
        MouseEventKind::ScrollUp => Some(TreeCommand::Up),
        MouseEventKind::ScrollDown => Some(TreeCommand::Down),
        MouseEventKind::Up(MouseButton::Left) => None,
        _ => return,
    };
    if let Some(cmd) = wheel {
        if let Some(target) = tree_at(app, x, y) {
            execute_tree_command(app, target, cmd);
        }
        return;
    }
    let double = app.clicks.register(x, y, Instant::now());

    if contains(app.buttonbar_area, x, y) {
        if let Some(cmd) = button_at(app.buttonbar_area, x).and_then(|n| app.keymap.function_key(n)) {
            let target = app.focused_tree();
            if !execute_tree_command(app, target, cmd) && cmd == TreeCommand::Quit {
                app.quit();
            }
        }
        return;
    }

    if let Some(target) = tree_at(app, x, y) {
        tree_mouse(app, target, y, double);
    } else if app.tree_box.is_none() && contains(app.listing_area, x, y) {
        listing_mouse(app, y, double);
    }
}

fn tree_mouse(app: &mut App, target: TreeTarget, y: u16, double: bool) {
    if target == TreeTarget::Panel && app.focus != Focus::Tree {
        app.set_focus(Focus::Tree);
    }
    let Some(tree) = app.tree_mut(target) else {
        return;
    };
    let border = if tree.is_panel() { 1 } else { 0 };
    let row = y as i32 - tree.area().y as i32 - border;
    let lines = tree.visible_rows();
    let jump = lines.saturating_sub(1);

    if row < 0 {
        tree.move_backward(jump);
    } else if row as usize >= lines {
        tree.move_forward(jump);
    } else {
        tree.select_row(row as usize);
        if double {
            execute_tree_command(app, target, TreeCommand::Enter);
        }
    }
}

fn listing_mouse(app: &mut App, y: u16, double: bool) {
    if app.focus != Focus::Listing {
        app.set_focus(Focus::Listing);
    }
    let Some(index) = entry_at(&app.shell.listing, app.listing_area, y) else {
        return;
    };
    app.shell.listing.selected_index = index;
    if double {
        listing_enter(app);
    }
}
