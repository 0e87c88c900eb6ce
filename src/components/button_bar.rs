use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::keymap::TreeKeymap;
use crate::theme::ThemeColors;
use crate::tree::command::TreeCommand;
use crate::tree::NavigationMode;

/// Number of function-key slots on the bar.
pub const BUTTONS: u8 = 10;

/// Label for the command bound to a function key. Commands without a
/// bar label leave the slot empty.
pub fn label_for(cmd: TreeCommand, navigation: NavigationMode) -> &'static str {
    match cmd {
        TreeCommand::Help => "Help",
        TreeCommand::Rescan => "Rescan",
        TreeCommand::Forget => "Forget",
        TreeCommand::ToggleNavigation => navigation.toggle_label(),
        TreeCommand::Copy => "Copy",
        TreeCommand::Move => "RenMov",
        TreeCommand::Rmdir => "Rmdir",
        TreeCommand::Quit => "Quit",
        _ => "",
    }
}

/// Horizontal span `[start, end)` of button `n` (1-based) in a bar `width` wide.
fn slot(width: u16, n: u8) -> (u16, u16) {
    let w = width as u32;
    let i = (n - 1) as u32;
    let start = w * i / BUTTONS as u32;
    let end = w * (i + 1) / BUTTONS as u32;
    (start as u16, end as u16)
}

/// Button under column `x` of a bar drawn in `area`.
pub fn button_at(area: Rect, x: u16) -> Option<u8> {
    if x < area.x || x >= area.x + area.width {
        return None;
    }
    let col = x - area.x;
    (1..=BUTTONS).find(|&n| {
        let (start, end) = slot(area.width, n);
        col >= start && col < end
    })
}

/// Bottom row of function-key labels for the focused tree.
pub struct ButtonBarWidget<'a> {
    keymap: &'a TreeKeymap,
    navigation: NavigationMode,
    theme: &'a ThemeColors,
}

impl<'a> ButtonBarWidget<'a> {
    pub fn new(keymap: &'a TreeKeymap, navigation: NavigationMode, theme: &'a ThemeColors) -> Self {
        Self {
            keymap,
            navigation,
            theme,
        }
    }

    pub fn label(&self, n: u8) -> &'static str {
        self.keymap
            .function_key(n)
            .map(|cmd| label_for(cmd, self.navigation))
            .unwrap_or("")
    }
}

impl<'a> Widget for ButtonBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let key_style = Style::default()
            .fg(self.theme.buttonbar_key_fg)
            .add_modifier(Modifier::BOLD);
        let label_style = Style::default()
            .fg(self.theme.buttonbar_fg)
            .bg(self.theme.buttonbar_bg);

        for n in 1..=BUTTONS {
            let (start, end) = slot(area.width, n);
            let width = end.saturating_sub(start);
            if width == 0 {
                continue;
            }
            let number = n.to_string();
            let room = (width as usize).saturating_sub(number.len());
            let label: String = self.label(n).chars().take(room).collect();
            let line = Line::from(vec![
                Span::styled(number, key_style),
                Span::styled(format!("{:<room$}", label), label_style),
            ]);
            buf.set_line(area.x + start, area.y, &line, width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;

    fn row(buf: &Buffer, area: Rect) -> String {
        (area.x..area.x + area.width)
            .map(|x| buf.cell((x, area.y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn default_labels() {
        let keymap = TreeKeymap::default();
        let theme = dark_theme();
        let bar = ButtonBarWidget::new(&keymap, NavigationMode::Flat, &theme);
        let labels: Vec<&str> = (1..=BUTTONS).map(|n| bar.label(n)).collect();
        assert_eq!(
            labels,
            vec!["Help", "Rescan", "Forget", "Dynamc", "Copy", "RenMov", "", "Rmdir", "", "Quit"]
        );
    }

    #[test]
    fn toggle_label_follows_navigation() {
        let keymap = TreeKeymap::default();
        let theme = dark_theme();
        let bar = ButtonBarWidget::new(&keymap, NavigationMode::Hierarchical, &theme);
        assert_eq!(bar.label(4), "Static");
    }

    #[test]
    fn renders_numbered_slots() {
        let keymap = TreeKeymap::default();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        ButtonBarWidget::new(&keymap, NavigationMode::Flat, &theme).render(area, &mut buf);
        let text = row(&buf, area);
        assert!(text.starts_with("1Help   2Rescan 3Forget"));
        assert!(text.contains("10Quit"));
    }

    #[test]
    fn hit_test_maps_columns_to_buttons() {
        let area = Rect::new(0, 23, 80, 1);
        assert_eq!(button_at(area, 0), Some(1));
        assert_eq!(button_at(area, 7), Some(1));
        assert_eq!(button_at(area, 8), Some(2));
        assert_eq!(button_at(area, 79), Some(10));
        assert_eq!(button_at(area, 80), None);
    }

    #[test]
    fn narrow_bar_still_covers_every_column() {
        let area = Rect::new(2, 0, 25, 1);
        for x in 2..27 {
            assert!(button_at(area, x).is_some(), "column {}", x);
        }
        assert_eq!(button_at(area, 1), None);
    }
}
