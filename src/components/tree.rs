use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::fs::store::{depth_bit, DirEntry, TreeStore};
use crate::theme::ThemeColors;
use crate::tree::TreeView;

/// Renders a [`TreeView`] with box-drawing connectors.
///
/// As an embedded panel the widget draws its own border and, with mini
/// info enabled, a separator plus a footer line. Otherwise the whole area
/// is tree rows with the footer on the last row.
pub struct TreeWidget<'a> {
    theme: &'a ThemeColors,
    show_mini_info: bool,
}

impl<'a> TreeWidget<'a> {
    pub fn new(theme: &'a ThemeColors) -> Self {
        Self {
            theme,
            show_mini_info: true,
        }
    }

    pub fn show_mini_info(mut self, show: bool) -> Self {
        self.show_mini_info = show;
        self
    }

    /// Text of one tree row: the full path at the top depth, otherwise
    /// connector columns, a branch corner and the display name.
    fn row_text(
        store: &TreeStore,
        entry: &DirEntry,
        top_depth: usize,
        width: usize,
    ) -> (String, String) {
        if entry.depth <= top_depth {
            return (String::new(), fit(&entry.path.to_string_lossy(), width));
        }

        let mut prefix = String::new();
        let mut columns = 0;
        for level in top_depth + 1..entry.depth {
            if width < 17 + 3 * columns {
                break;
            }
            prefix.push(' ');
            prefix.push(if entry.sibling_mask & depth_bit(level) != 0 {
                '│'
            } else {
                ' '
            });
            prefix.push(' ');
            columns += 1;
        }

        let continues = entry
            .next
            .and_then(|next| store.get(next))
            .is_some_and(|next| next.sibling_mask & depth_bit(entry.depth) != 0);
        prefix.push(' ');
        prefix.push(if continues { '├' } else { '└' });
        prefix.push('─');
        prefix.push(' ');

        let used = 3 * columns + 4;
        (prefix, fit(&entry.name, width.saturating_sub(used)))
    }
}

impl StatefulWidget for TreeWidget<'_> {
    type State = TreeView;

    fn render(self, area: Rect, buf: &mut Buffer, view: &mut TreeView) {
        view.set_area(area);
        let base = Style::default().fg(self.theme.tree_fg);
        buf.set_style(area, base);

        let (inner, rows, footer_row) = if view.is_panel() {
            let border_fg = if view.is_active() {
                self.theme.border_focused_fg
            } else {
                self.theme.border_fg
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Directory tree ")
                .border_style(Style::default().fg(border_fg));
            let inner = block.inner(area);
            block.render(area, buf);
            if self.show_mini_info && inner.height >= 2 {
                let rows = inner.height - 2;
                let separator = inner.y + rows;
                for x in inner.x..inner.x + inner.width {
                    buf[(x, separator)]
                        .set_symbol("─")
                        .set_style(Style::default().fg(border_fg));
                }
                (inner, rows, Some(separator + 1))
            } else {
                (inner, inner.height, None)
            }
        } else if area.height >= 1 {
            (area, area.height - 1, Some(area.y + area.height - 1))
        } else {
            (area, 0, None)
        };

        let width = inner.width as usize;
        let shown = view.layout(rows as usize).to_vec();
        let selected = view.selected();
        let highlight = !view.is_panel() || view.is_active();

        {
            let store = view.store().borrow();
            let top_depth = store
                .first()
                .and_then(|id| store.depth_of(id))
                .unwrap_or(0);

            for (i, id) in shown.iter().enumerate() {
                let Some(entry) = store.get(*id) else {
                    continue;
                };
                let y = inner.y + i as u16;
                let is_selected = highlight && Some(*id) == selected;
                let name_style = if is_selected {
                    Style::default()
                        .bg(self.theme.tree_selected_bg)
                        .fg(self.theme.tree_selected_fg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                let line_style = if is_selected {
                    name_style
                } else {
                    Style::default().fg(self.theme.tree_line_fg)
                };
                if is_selected {
                    buf.set_style(Rect::new(inner.x, y, inner.width, 1), name_style);
                }
                let (prefix, name) = Self::row_text(&store, entry, top_depth, width);
                let line = Line::from(vec![
                    Span::styled(prefix, line_style),
                    Span::styled(name, name_style),
                ]);
                buf.set_line(inner.x, y, &line, inner.width);
            }
        }

        if let Some(y) = footer_row {
            let (text, style) = if view.is_searching() {
                (
                    format!("/{}", fit(view.search_text(), width.saturating_sub(2))),
                    Style::default()
                        .bg(self.theme.input_bg)
                        .fg(self.theme.input_fg),
                )
            } else {
                let path = view
                    .selected_path()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default();
                (fit(&path, width), base)
            };
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            buf.set_line(inner.x, y, &Line::from(Span::styled(text, style)), inner.width);
        }
    }
}

/// Fit `text` into `width` columns, replacing the middle with `~` when it
/// is too long.
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let head = (width - 1) / 2;
    let tail = width - 1 - head;
    let mut out: String = text.chars().take(head).collect();
    out.push('~');
    out.extend(text.chars().skip(count - tail));
    out
}
