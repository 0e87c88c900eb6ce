//! Colors for the tree, listing, button bar and dialogs.
//!
//! `dark` and `light` are built in; `custom` starts from `dark` and applies
//! hex overrides from `[theme.custom]`.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// Resolved palette handed to every widget.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_line_fg: Color,

    // Mini-info line while searching
    pub input_bg: Color,
    pub input_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Button bar
    pub buttonbar_key_fg: Color,
    pub buttonbar_bg: Color,
    pub buttonbar_fg: Color,

    // Dialogs
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Semantic colors (not configurable, consistent across themes)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_line_fg: Color::Rgb(108, 112, 134),     // #6c7086 (overlay0)

        input_bg: Color::Rgb(49, 50, 68),  // #313244 (surface0)
        input_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)

        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        buttonbar_key_fg: Color::Rgb(205, 214, 244),
        buttonbar_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        buttonbar_fg: Color::Rgb(137, 180, 250),

        dialog_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_line_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)

        input_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)
        input_fg: Color::Rgb(223, 142, 29),  // #df8e1d (yellow)

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        buttonbar_key_fg: Color::Rgb(76, 79, 105),
        buttonbar_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        buttonbar_fg: Color::Rgb(30, 102, 245),

        dialog_bg: Color::Rgb(230, 233, 239),
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// `"#rrggbb"` (the `#` is optional) as an RGB color.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(digits, 16).ok()?;
    let [_, r, g, b] = rgb.to_be_bytes();
    Some(Color::Rgb(r, g, b))
}

/// Overwrite `slot` when `hex` parses; leave it alone otherwise.
fn override_color(slot: &mut Color, hex: Option<&str>) {
    if let Some(color) = hex.and_then(parse_hex_color) {
        *slot = color;
    }
}

/// Palette for the configured scheme. Unknown schemes fall back to dark.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref() {
        Some("light") => light_theme(),
        Some("custom") => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    override_color(&mut theme.tree_fg, custom.tree_fg.as_deref());
    override_color(&mut theme.tree_selected_bg, custom.tree_selected_bg.as_deref());
    override_color(&mut theme.tree_selected_fg, custom.tree_selected_fg.as_deref());
    override_color(&mut theme.input_bg, custom.input_bg.as_deref());
    override_color(&mut theme.input_fg, custom.input_fg.as_deref());
    override_color(&mut theme.border_fg, custom.border_fg.as_deref());
    override_color(&mut theme.buttonbar_bg, custom.buttonbar_bg.as_deref());
    override_color(&mut theme.buttonbar_fg, custom.buttonbar_fg.as_deref());
    override_color(&mut theme.dialog_bg, custom.dialog_bg.as_deref());
    override_color(&mut theme.dialog_border_fg, custom.dialog_border_fg.as_deref());
}
