use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::components::tree::fit;
use crate::fs::listing::{DirListing, NodeType};
use crate::theme::ThemeColors;

/// Directory listing shown beside the tree panel.
pub struct ListingWidget<'a> {
    theme: &'a ThemeColors,
    focused: bool,
}

impl<'a> ListingWidget<'a> {
    pub fn new(theme: &'a ThemeColors, focused: bool) -> Self {
        Self { theme, focused }
    }

    fn block(&self, listing: &DirListing, width: u16) -> Block<'static> {
        let border = if self.focused {
            self.theme.border_focused_fg
        } else {
            self.theme.border_fg
        };
        let title = fit(
            &listing.dir.to_string_lossy(),
            (width as usize).saturating_sub(4),
        );
        Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
    }
}

/// Index of the entry drawn at screen row `y` of a listing rendered in `area`.
pub fn entry_at(listing: &DirListing, area: Rect, y: u16) -> Option<usize> {
    let inner = Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    );
    if y < inner.y || y >= inner.y + inner.height {
        return None;
    }
    let index = listing.scroll_offset + (y - inner.y) as usize;
    (index < listing.entries.len()).then_some(index)
}

impl<'a> StatefulWidget for ListingWidget<'a> {
    type State = DirListing;

    fn render(self, area: Rect, buf: &mut Buffer, listing: &mut DirListing) {
        if area.width < 3 || area.height < 3 {
            return;
        }
        let block = self.block(listing, area.width);
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = inner.height as usize;
        listing.update_scroll(rows);
        let width = inner.width as usize;

        for (i, entry) in listing
            .entries
            .iter()
            .enumerate()
            .skip(listing.scroll_offset)
            .take(rows)
        {
            let y = inner.y + (i - listing.scroll_offset) as u16;
            let (marker, mut style) = match entry.node_type {
                NodeType::Directory => ("/", Style::default().fg(self.theme.info_fg)),
                NodeType::Symlink if entry.is_dir_like() => {
                    ("~", Style::default().fg(self.theme.info_fg))
                }
                NodeType::Symlink => ("@", Style::default().fg(self.theme.accent_fg)),
                NodeType::File => (" ", Style::default().fg(self.theme.tree_fg)),
            };
            if entry.is_hidden {
                style = style.fg(self.theme.dim_fg);
            }
            if i == listing.selected_index && self.focused {
                style = Style::default()
                    .fg(self.theme.tree_selected_fg)
                    .bg(self.theme.tree_selected_bg)
                    .add_modifier(Modifier::BOLD);
                buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            }
            let text = fit(
                &format!("{}{}", marker, entry.name),
                width,
            );
            buf.set_line(inner.x, y, &Line::from(Span::styled(text, style)), inner.width);
        }
    }
}
