use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::theme::ThemeColors;
use crate::tree::command::trunc_path;

/// Widest a path may be inside a copy or move prompt.
const PROMPT_PATH_WIDTH: usize = 50;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }

    fn frame(&self, title: &str, border: Style, rect: Rect, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border)
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);
        buf.set_line(
            inner.x,
            inner.y + inner.height - 1,
            &Line::from(Span::styled(text, style)),
            inner.width,
        );
    }
}

/// Prompt shown above the input line of a copy or move dialog.
pub fn prompt_for(kind: &DialogKind) -> Option<String> {
    match kind {
        DialogKind::CopyTo { source } => Some(format!(
            "Copy \"{}\" directory to:",
            trunc_path(source, PROMPT_PATH_WIDTH)
        )),
        DialogKind::MoveTo { source } => Some(format!(
            "Move \"{}\" directory to:",
            trunc_path(source, PROMPT_PATH_WIDTH)
        )),
        _ => None,
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::CopyTo { .. } | DialogKind::MoveTo { .. } => {
                let title = if matches!(kind, DialogKind::CopyTo { .. }) {
                    "Copy"
                } else {
                    "Move"
                };
                let prompt = prompt_for(kind).unwrap_or_default();
                self.render_input(title, &prompt, area, buf);
            }
            DialogKind::DeleteConfirm { dir } => {
                let message = format!("Delete {}?", dir.display());
                self.render_confirm(&message, area, buf);
            }
            DialogKind::Error { message } => {
                self.render_error(message, area, buf);
            }
        }
    }
}

impl DialogWidget<'_> {
    fn render_input(&self, title: &str, prompt: &str, area: Rect, buf: &mut Buffer) {
        let width = (prompt.chars().count() as u16 + 6)
            .max(50)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 6, area);
        let border = Style::default().fg(self.theme.dialog_border_fg);
        let inner = self.frame(title, border, rect, buf);
        if inner.height < 2 || inner.width == 0 {
            return;
        }

        buf.set_line(
            inner.x,
            inner.y,
            &Line::from(Span::styled(prompt, Style::default().fg(self.theme.tree_fg))),
            inner.width,
        );

        let input = &self.dialog_state.input;
        let cursor = self.dialog_state.cursor_position.min(input.len());
        let before = &input[..cursor];
        let (cursor_char, after) = match input[cursor..].chars().next() {
            Some(c) => (&input[cursor..cursor + c.len_utf8()], &input[cursor + c.len_utf8()..]),
            None => (" ", ""),
        };

        // Keep the cursor on screen by dropping characters from the left.
        let room = (inner.width as usize).saturating_sub(2);
        let before_len = before.chars().count();
        let before_display: String = if before_len > room {
            before.chars().skip(before_len - room).collect()
        } else {
            before.to_string()
        };

        let input_style = Style::default()
            .fg(self.theme.input_fg)
            .bg(self.theme.input_bg);
        let cursor_style = input_style.add_modifier(Modifier::REVERSED);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_style(Rect::new(inner.x, inner.y + 1, inner.width, 1), input_style);
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);

        if inner.height > 2 {
            self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
        }
    }

    fn render_confirm(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .max(40)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 5, area);
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Delete", border, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let style = Style::default()
            .fg(self.theme.warning_fg)
            .add_modifier(Modifier::BOLD);
        buf.set_line(
            inner.x,
            inner.y,
            &Line::from(Span::styled(message, style)),
            inner.width,
        );
        if inner.height > 1 {
            self.hint("[y/Enter] Yes  [n/Esc] No", inner, buf);
        }
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let lines: Vec<&str> = message.lines().collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = (longest as u16 + 6)
            .max(30)
            .min(area.width.saturating_sub(4));
        let height = (lines.len() as u16 + 4).min(area.height);
        let rect = Self::centered_rect(width, height, area);
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Error", border, rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let style = Style::default().fg(self.theme.error_fg);
        let rows = inner.height.saturating_sub(1) as usize;
        for (i, text) in lines.iter().take(rows).enumerate() {
            buf.set_line(
                inner.x,
                inner.y + i as u16,
                &Line::from(Span::styled(*text, style)),
                inner.width,
            );
        }
        if inner.height > 1 {
            self.hint("[Enter/Esc] Dismiss", inner, buf);
        }
    }
}
