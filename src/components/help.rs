use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::keymap::TreeKeymap;
use crate::theme::ThemeColors;
use crate::tree::command::TreeCommand;

/// A single keybinding entry for display.
struct KeyEntry {
    key: String,
    description: &'static str,
}

impl KeyEntry {
    fn fixed(key: &str, description: &'static str) -> Self {
        Self {
            key: key.to_string(),
            description,
        }
    }
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: Vec<KeyEntry>,
}

const SEARCH_KEYS: &[(&str, &str)] = &[
    ("any letter", "Start searching for a directory name"),
    ("Backspace", "Remove the last search character"),
    ("Ctrl-s / Alt-s", "Jump to the next match"),
    ("Esc", "Stop searching"),
];

const PANEL_KEYS: &[(&str, &str)] = &[
    ("Tab", "Switch between tree and listing"),
    ("Enter", "Open directory (listing)"),
    ("Backspace", "Parent directory (listing)"),
    ("Ctrl-c", "Quit"),
];

const MOUSE_KEYS: &[(&str, &str)] = &[
    ("Click", "Select the clicked directory"),
    ("Double click", "Change panel to directory"),
    ("Click above / below", "Scroll one page"),
    ("Button bar", "Run the labelled command"),
];

/// Help overlay listing the tree's current key bindings.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
    keymap: &'a TreeKeymap,
    topic: &'a str,
    scroll_offset: usize,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(
        theme: &'a ThemeColors,
        keymap: &'a TreeKeymap,
        topic: &'a str,
        scroll_offset: usize,
    ) -> Self {
        Self {
            theme,
            keymap,
            topic,
            scroll_offset,
        }
    }

    fn categories(&self) -> Vec<KeyCategory> {
        let tree = TreeCommand::ALL
            .into_iter()
            .filter(|cmd| *cmd != TreeCommand::Chdir)
            .filter_map(|cmd| {
                let keys = self.keymap.keys_for(cmd);
                if keys.is_empty() {
                    return None;
                }
                let key = keys
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" / ");
                Some(KeyEntry {
                    key,
                    description: cmd.description(),
                })
            })
            .collect();
        let fixed = |table: &[(&str, &'static str)]| -> Vec<KeyEntry> {
            table
                .iter()
                .map(|(k, d)| KeyEntry::fixed(k, d))
                .collect()
        };
        vec![
            KeyCategory {
                name: "Tree",
                entries: tree,
            },
            KeyCategory {
                name: "Search",
                entries: fixed(SEARCH_KEYS),
            },
            KeyCategory {
                name: "Panels",
                entries: fixed(PANEL_KEYS),
            },
            KeyCategory {
                name: "Mouse",
                entries: fixed(MOUSE_KEYS),
            },
        ]
    }

    /// Build all the lines for the help content.
    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        lines.push(Line::from(vec![Span::styled(
            format!(" {} ", self.topic),
            Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD),
        )]));
        lines.push(Line::from(""));

        for category in self.categories() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("── {} ", category.name),
                    Style::default()
                        .fg(self.theme.accent_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("─".repeat(40), Style::default().fg(self.theme.dim_fg)),
            ]));

            for entry in category.entries {
                let key_padded = format!("  {:<24}", entry.key);
                lines.push(Line::from(vec![
                    Span::styled(
                        key_padded,
                        Style::default()
                            .fg(self.theme.warning_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.description.to_string(),
                        Style::default().fg(self.theme.tree_fg),
                    ),
                ]));
            }

            lines.push(Line::from(""));
        }

        lines.push(Line::from(vec![Span::styled(
            " Press Esc or F10 to close ",
            Style::default().fg(self.theme.dim_fg),
        )]));

        lines
    }

    /// Total number of content lines, for scroll bounds.
    pub fn total_lines(&self) -> usize {
        // title, blank, footer, plus a header and a blank per category
        3 + self
            .categories()
            .iter()
            .map(|c| c.entries.len() + 2)
            .sum::<usize>()
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let overlay_width = (area.width as f32 * 0.70).min(80.0) as u16;
        let overlay_height = (area.height as f32 * 0.80).min(50.0) as u16;

        let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
        let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
        let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg));

        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        let content_lines = self.build_content_lines();
        let visible_height = inner.height as usize;
        let scroll = self.scroll_offset;

        for (i, line) in content_lines
            .iter()
            .skip(scroll)
            .take(visible_height)
            .enumerate()
        {
            buf.set_line(
                inner.x + 1,
                inner.y + i as u16,
                line,
                inner.width.saturating_sub(2),
            );
        }

        if content_lines.len() > visible_height && overlay_area.height > 0 {
            let total = content_lines.len();
            let indicator = format!(" {}/{} ", (scroll + 1).min(total), total);
            let ind_span = Span::styled(indicator, Style::default().fg(self.theme.dim_fg));
            let ind_x = overlay_area.x
                + overlay_area
                    .width
                    .saturating_sub(ind_span.width() as u16 + 1);
            let ind_y = overlay_area.y + overlay_area.height - 1;
            buf.set_span(ind_x, ind_y, &ind_span, ind_span.width() as u16);
        }
    }
}
