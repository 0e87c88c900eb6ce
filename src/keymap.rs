//! Tree key bindings: built-in defaults plus `[keys]` overrides from config.

use std::collections::BTreeMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tree::command::TreeCommand;

/// A single key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let (code, modifiers) = normalize(code, modifiers);
        Self { code, modifiers }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        (self.code, self.modifiers) == normalize(key.code, key.modifiers)
    }

    /// Parse a key spec such as `f5`, `pageup`, `ctrl-s` or `alt-<`.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = spec.trim();
        loop {
            let lower = rest.to_ascii_lowercase();
            if let Some(tail) = lower.strip_prefix("ctrl-") {
                modifiers |= KeyModifiers::CONTROL;
                rest = &rest[rest.len() - tail.len()..];
            } else if let Some(tail) = lower.strip_prefix("alt-") {
                modifiers |= KeyModifiers::ALT;
                rest = &rest[rest.len() - tail.len()..];
            } else if let Some(tail) = lower.strip_prefix("shift-") {
                modifiers |= KeyModifiers::SHIFT;
                rest = &rest[rest.len() - tail.len()..];
            } else {
                break;
            }
        }

        let mut chars = rest.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => match rest.to_ascii_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdn" => KeyCode::PageDown,
                "enter" => KeyCode::Enter,
                "delete" => KeyCode::Delete,
                "backspace" => KeyCode::Backspace,
                "esc" => KeyCode::Esc,
                "tab" => KeyCode::Tab,
                "space" => KeyCode::Char(' '),
                other => {
                    let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                    if !(1..=12).contains(&n) {
                        return None;
                    }
                    KeyCode::F(n)
                }
            },
        };
        Some(Self::new(code, modifiers))
    }
}

/// Characters carry their case themselves, so shift is dropped for them.
fn normalize(code: KeyCode, modifiers: KeyModifiers) -> (KeyCode, KeyModifiers) {
    let modifiers = modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
    match code {
        KeyCode::Char(c) => {
            let c = if modifiers.contains(KeyModifiers::CONTROL) {
                c.to_ascii_lowercase()
            } else {
                c
            };
            (KeyCode::Char(c), modifiers - KeyModifiers::SHIFT)
        }
        other => (other, modifiers),
    }
}

impl fmt::Display for KeyBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift-")?;
        }
        match self.code {
            KeyCode::F(n) => write!(f, "F{}", n),
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::PageUp => write!(f, "PgUp"),
            KeyCode::PageDown => write!(f, "PgDn"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Ordered key → command table for tree views.
#[derive(Debug, Clone)]
pub struct TreeKeymap {
    bindings: Vec<(KeyBind, TreeCommand)>,
}

impl Default for TreeKeymap {
    fn default() -> Self {
        use KeyCode as K;
        use TreeCommand as C;
        let none = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let alt = KeyModifiers::ALT;
        let bindings = [
            (K::F(1), none, C::Help),
            (K::F(2), none, C::Rescan),
            (K::Char('r'), ctrl, C::Rescan),
            (K::F(3), none, C::Forget),
            (K::F(4), none, C::ToggleNavigation),
            (K::F(5), none, C::Copy),
            (K::F(6), none, C::Move),
            (K::F(8), none, C::Rmdir),
            (K::Delete, none, C::Rmdir),
            (K::Up, none, C::Up),
            (K::Char('p'), ctrl, C::Up),
            (K::Down, none, C::Down),
            (K::Char('n'), ctrl, C::Down),
            (K::Left, none, C::Left),
            (K::Right, none, C::Right),
            (K::Home, none, C::Home),
            (K::Char('<'), alt, C::Home),
            (K::End, none, C::End),
            (K::Char('>'), alt, C::End),
            (K::PageUp, none, C::PageUp),
            (K::Char('v'), alt, C::PageUp),
            (K::PageDown, none, C::PageDown),
            (K::Char('v'), ctrl, C::PageDown),
            (K::Enter, none, C::Enter),
            (K::Char('s'), ctrl, C::Search),
            (K::Char('s'), alt, C::Search),
            (K::Char('t'), alt, C::ShowBox),
            (K::F(10), none, C::Quit),
        ]
        .into_iter()
        .map(|(code, modifiers, cmd)| (KeyBind::new(code, modifiers), cmd))
        .collect();
        Self { bindings }
    }
}

impl TreeKeymap {
    /// Defaults with `overrides` (key spec → command name) applied on top.
    /// An override replaces whatever the key was bound to before.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (spec, name) in overrides {
            let Some(bind) = KeyBind::parse(spec) else {
                tracing::warn!(key = %spec, "ignoring unparsable key binding");
                continue;
            };
            let Some(cmd) = TreeCommand::from_name(name) else {
                tracing::warn!(key = %spec, command = %name, "ignoring binding to unknown command");
                continue;
            };
            map.bind(bind, cmd);
        }
        map
    }

    pub fn bind(&mut self, bind: KeyBind, cmd: TreeCommand) {
        self.bindings.retain(|(b, _)| *b != bind);
        self.bindings.push((bind, cmd));
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<TreeCommand> {
        self.bindings
            .iter()
            .find(|(bind, _)| bind.matches(key))
            .map(|(_, cmd)| *cmd)
    }

    /// Keys bound to `cmd`, in table order.
    pub fn keys_for(&self, cmd: TreeCommand) -> Vec<KeyBind> {
        self.bindings
            .iter()
            .filter(|(_, c)| *c == cmd)
            .map(|(b, _)| *b)
            .collect()
    }

    /// Command bound to function key `n`, used by the button bar.
    pub fn function_key(&self, n: u8) -> Option<TreeCommand> {
        self.lookup(&KeyEvent::new(KeyCode::F(n), KeyModifiers::NONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_defaults() {
        let map = TreeKeymap::default();
        assert_eq!(
            map.lookup(&key(KeyCode::F(4), KeyModifiers::NONE)),
            Some(TreeCommand::ToggleNavigation)
        );
        assert_eq!(
            map.lookup(&key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(TreeCommand::Search)
        );
        assert_eq!(map.lookup(&key(KeyCode::Char('s'), KeyModifiers::NONE)), None);
        assert_eq!(map.function_key(8), Some(TreeCommand::Rmdir));
        assert_eq!(map.function_key(7), None);
    }

    #[test]
    fn test_shifted_characters_match_without_shift() {
        let map = TreeKeymap::default();
        let event = key(
            KeyCode::Char('>'),
            KeyModifiers::ALT | KeyModifiers::SHIFT,
        );
        assert_eq!(map.lookup(&event), Some(TreeCommand::End));
    }

    #[test]
    fn test_parse_specs() {
        assert_eq!(
            KeyBind::parse("f12"),
            Some(KeyBind::new(KeyCode::F(12), KeyModifiers::NONE))
        );
        assert_eq!(
            KeyBind::parse("Ctrl-Alt-x"),
            Some(KeyBind::new(
                KeyCode::Char('x'),
                KeyModifiers::CONTROL | KeyModifiers::ALT
            ))
        );
        assert_eq!(
            KeyBind::parse("shift-pageup"),
            Some(KeyBind::new(KeyCode::PageUp, KeyModifiers::SHIFT))
        );
        assert_eq!(
            KeyBind::parse("-"),
            Some(KeyBind::new(KeyCode::Char('-'), KeyModifiers::NONE))
        );
        assert_eq!(KeyBind::parse("f13"), None);
        assert_eq!(KeyBind::parse("hyper-q"), None);
        assert_eq!(KeyBind::parse(""), None);
    }

    #[test]
    fn test_overrides_replace_and_skip_invalid() {
        let mut keys = BTreeMap::new();
        keys.insert("f2".to_string(), "forget".to_string());
        keys.insert("ctrl-f".to_string(), "search_begin".to_string());
        keys.insert("f9".to_string(), "no_such_command".to_string());
        keys.insert("nonsense-key".to_string(), "help".to_string());

        let map = TreeKeymap::with_overrides(&keys);
        assert_eq!(map.function_key(2), Some(TreeCommand::Forget));
        assert_eq!(
            map.lookup(&key(KeyCode::Char('f'), KeyModifiers::CONTROL)),
            Some(TreeCommand::Search)
        );
        assert_eq!(map.function_key(9), None);
        // Other rescan binding survives.
        assert_eq!(
            map.lookup(&key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(TreeCommand::Rescan)
        );
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(
            KeyBind::new(KeyCode::Char('s'), KeyModifiers::CONTROL).to_string(),
            "Ctrl-s"
        );
        assert_eq!(KeyBind::new(KeyCode::F(5), KeyModifiers::NONE).to_string(), "F5");
        assert_eq!(
            KeyBind::new(KeyCode::PageDown, KeyModifiers::NONE).to_string(),
            "PgDn"
        );
        let map = TreeKeymap::default();
        let labels: Vec<String> = map
            .keys_for(TreeCommand::Up)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(labels, vec!["Up".to_string(), "Ctrl-p".to_string()]);
    }
}
