use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear},
    Frame,
};

use crate::app::{App, AppMode, Focus};
use crate::components::button_bar::ButtonBarWidget;
use crate::components::dialog::DialogWidget;
use crate::components::help::HelpOverlay;
use crate::components::listing::ListingWidget;
use crate::components::tree::TreeWidget;

/// Area of the modal tree box: the screen less 20 columns and 9 lines.
pub fn tree_box_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(20).max(area.width.min(20));
    let height = area.height.saturating_sub(9).max(area.height.min(5));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let tree = TreeWidget::new(&app.theme).show_mini_info(app.show_mini_info);
    frame.render_stateful_widget(tree, panels[0], &mut app.panel);

    app.listing_area = panels[1];
    let listing = ListingWidget::new(&app.theme, app.focus == Focus::Listing);
    frame.render_stateful_widget(listing, panels[1], &mut app.shell.listing);

    app.buttonbar_area = rows[1];
    frame.render_widget(
        ButtonBarWidget::new(&app.keymap, app.navigation.get(), &app.theme),
        rows[1],
    );

    if let Some(tree_box) = app.tree_box.as_mut() {
        let rect = tree_box_rect(area);
        frame.render_widget(Clear, rect);
        let block = Block::default()
            .title(" Directory tree ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.dialog_border_fg))
            .style(Style::default().bg(app.theme.dialog_bg));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        frame.render_stateful_widget(TreeWidget::new(&app.theme), inner, tree_box);
    }

    match &app.shell.mode {
        AppMode::Dialog(_) => {
            frame.render_widget(
                DialogWidget::new(&app.shell.mode, &app.shell.dialog_state, &app.theme),
                area,
            );
        }
        AppMode::Help { topic, scroll } => {
            frame.render_widget(HelpOverlay::new(&app.theme, &app.keymap, topic, *scroll), area);
        }
        AppMode::Normal => {}
    }
}
