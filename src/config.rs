//! Layered TOML configuration.
//!
//! Later layers override earlier ones, value by value:
//! built-in defaults, `~/.config/dtree/config.toml`, `./.dtree.toml`,
//! the file named by `$DTREE_CONFIG`, the `--config` file, and finally
//! the command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tree::NavigationMode;

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Confirm before removing a directory.
    pub confirm_delete: Option<bool>,
    /// Write a log to this file.
    pub log_file: Option<String>,
}

/// Directory tree settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Navigation mode: "flat" or "hierarchical".
    pub navigation: Option<String>,
    /// Make the listing panel follow the panel tree's selection.
    pub auto_chdir: Option<bool>,
    /// Show the selected path under the panel tree.
    pub show_mini_info: Option<bool>,
    /// Include dot-directories when scanning.
    pub show_hidden: Option<bool>,
    /// Where the known directories are saved between runs.
    pub tree_file: Option<String>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub input_bg: Option<String>,
    pub input_fg: Option<String>,
    pub border_fg: Option<String>,
    pub buttonbar_bg: Option<String>,
    pub buttonbar_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

/// Every setting dtree reads. Each field is optional so a layer only
/// overrides what it names; the getters below supply defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub watcher: WatcherConfig,
    pub theme: ThemeConfig,
    /// Key bindings: key spec -> command name.
    pub keys: BTreeMap<String, String>,
}

/// Debounce interval used when the config does not set one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Environment variable naming an extra config file.
const CONFIG_ENV: &str = "DTREE_CONFIG";

/// Config files consulted on every start, lowest priority first.
/// An explicit `--config` file is layered on top by [`AppConfig::load`].
fn layered_paths() -> Vec<PathBuf> {
    let global = dirs::config_dir().map(|d| d.join("dtree").join("config.toml"));
    let local = std::env::current_dir().ok().map(|cwd| cwd.join(".dtree.toml"));
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    [global, local, from_env].into_iter().flatten().collect()
}

/// Parse one config file. A missing file is silently skipped; a malformed
/// one is reported on stderr and skipped.
fn load_file(path: &Path) -> Option<AppConfig> {
    let text = std::fs::read_to_string(path).ok()?;
    toml::from_str::<AppConfig>(&text)
        .map_err(|e| eprintln!("dtree: ignoring config {}: {}", path.display(), e))
        .ok()
}

impl AppConfig {
    /// Layer `other` over `self`. Any value `other` sets wins; key
    /// bindings are combined per key.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        let mut keys = self.keys;
        keys.extend(other.keys.iter().map(|(k, v)| (k.clone(), v.clone())));
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
                log_file: other.general.log_file.clone().or(self.general.log_file),
            },
            tree: TreeConfig {
                navigation: other.tree.navigation.clone().or(self.tree.navigation),
                auto_chdir: other.tree.auto_chdir.or(self.tree.auto_chdir),
                show_mini_info: other.tree.show_mini_info.or(self.tree.show_mini_info),
                show_hidden: other.tree.show_hidden.or(self.tree.show_hidden),
                tree_file: other.tree.tree_file.clone().or(self.tree.tree_file),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
            keys,
        }
    }

    /// Resolve the effective configuration: built-in defaults, then the
    /// layered files, then `explicit` (from `--config`), then `overrides`.
    pub fn load(explicit: Option<&Path>, overrides: Option<&AppConfig>) -> AppConfig {
        let files = layered_paths()
            .into_iter()
            .chain(explicit.map(Path::to_path_buf))
            .filter_map(|path| load_file(&path));
        let config = files.fold(AppConfig::default(), |acc, file| acc.merge(&file));
        match overrides {
            Some(cli) => config.merge(cli),
            None => config,
        }
    }

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Whether to confirm before removing a directory.
    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.general.log_file.as_deref().map(expand_home)
    }

    /// Initial navigation mode.
    pub fn navigation(&self) -> NavigationMode {
        self.tree
            .navigation
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }

    pub fn auto_chdir(&self) -> bool {
        self.tree.auto_chdir.unwrap_or(false)
    }

    pub fn show_mini_info(&self) -> bool {
        self.tree.show_mini_info.unwrap_or(true)
    }

    pub fn show_hidden(&self) -> bool {
        self.tree.show_hidden.unwrap_or(false)
    }

    /// Tree file location; defaults to `<cache_dir>/dtree/tree.json`.
    pub fn tree_file(&self) -> Option<PathBuf> {
        match self.tree.tree_file.as_deref() {
            Some(path) => Some(expand_home(path)),
            None => dirs::cache_dir().map(|d| d.join("dtree").join("tree.json")),
        }
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AppConfig {
        toml::from_str(text).expect("valid toml")
    }

    #[test]
    fn empty_config_uses_builtin_defaults() {
        let cfg = parse("");
        assert!(cfg.mouse_enabled());
        assert!(cfg.confirm_delete());
        assert_eq!(cfg.log_file(), None);
        assert_eq!(cfg.navigation(), NavigationMode::Flat);
        assert!(!cfg.auto_chdir());
        assert!(cfg.show_mini_info());
        assert!(!cfg.show_hidden());
        assert!(cfg.watcher_enabled());
        assert_eq!(cfg.debounce_ms(), DEFAULT_DEBOUNCE_MS);
        assert_eq!(cfg.theme_scheme(), "dark");
        assert!(cfg.keys.is_empty());
    }

    #[test]
    fn every_section_is_read() {
        let cfg = parse(
            r#"
[general]
mouse = false
confirm_delete = false
log_file = "/tmp/dtree.log"

[tree]
navigation = "hierarchical"
auto_chdir = true
show_mini_info = false
show_hidden = true
tree_file = "/var/tmp/tree.json"

[watcher]
enabled = false
debounce_ms = 120

[theme]
scheme = "light"

[keys]
"ctrl-f" = "search_begin"
"#,
        );
        assert!(!cfg.mouse_enabled());
        assert!(!cfg.confirm_delete());
        assert_eq!(cfg.log_file(), Some(PathBuf::from("/tmp/dtree.log")));
        assert_eq!(cfg.navigation(), NavigationMode::Hierarchical);
        assert!(cfg.auto_chdir());
        assert!(!cfg.show_mini_info());
        assert!(cfg.show_hidden());
        assert_eq!(cfg.tree_file(), Some(PathBuf::from("/var/tmp/tree.json")));
        assert!(!cfg.watcher_enabled());
        assert_eq!(cfg.debounce_ms(), 120);
        assert_eq!(cfg.theme_scheme(), "light");
        assert_eq!(cfg.keys.get("ctrl-f").map(String::as_str), Some("search_begin"));
    }

    #[test]
    fn missing_keys_keep_their_defaults() {
        let cfg = parse("[tree]\nauto_chdir = true\n");
        assert!(cfg.auto_chdir());
        assert!(cfg.confirm_delete());
        assert_eq!(cfg.navigation(), NavigationMode::Flat);
    }

    #[test]
    fn unknown_navigation_falls_back_to_flat() {
        let cfg = parse("[tree]\nnavigation = \"sideways\"\n");
        assert_eq!(cfg.navigation(), NavigationMode::Flat);
    }

    #[test]
    fn upper_layer_wins_only_where_set() {
        let lower = parse(
            "[general]\nmouse = false\nconfirm_delete = false\n[tree]\nshow_hidden = true\nnavigation = \"hierarchical\"\n",
        );
        let upper = parse("[general]\nmouse = true\n[tree]\nnavigation = \"flat\"\n");

        let merged = lower.merge(&upper);
        assert!(merged.mouse_enabled());
        assert!(!merged.confirm_delete());
        assert!(merged.show_hidden());
        assert_eq!(merged.navigation(), NavigationMode::Flat);
    }

    #[test]
    fn empty_layer_changes_nothing() {
        let lower = parse("[watcher]\nenabled = false\ndebounce_ms = 40\n");
        let merged = lower.merge(&AppConfig::default());
        assert!(!merged.watcher_enabled());
        assert_eq!(merged.debounce_ms(), 40);
    }

    #[test]
    fn key_bindings_combine_across_layers() {
        let lower = parse("[keys]\nf7 = \"rescan\"\nf9 = \"help\"\n");
        let upper = parse("[keys]\nf9 = \"forget\"\n");

        let merged = lower.merge(&upper);
        assert_eq!(merged.keys.len(), 2);
        assert_eq!(merged.keys.get("f7").map(String::as_str), Some("rescan"));
        assert_eq!(merged.keys.get("f9").map(String::as_str), Some("forget"));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dtree.toml");
        std::fs::write(&path, "[tree]\nnavigation = \"dynamic\"\n[watcher]\ndebounce_ms = 75\n")
            .expect("write");

        let cfg = load_file(&path).expect("loaded");
        assert_eq!(cfg.navigation(), NavigationMode::Hierarchical);
        assert_eq!(cfg.debounce_ms(), 75);
        assert!(cfg.watcher_enabled());
    }

    #[test]
    fn unreadable_or_broken_files_are_skipped() {
        assert!(load_file(Path::new("/does/not/exist.toml")).is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[tree\nnavigation =").expect("write");
        assert!(load_file(&path).is_none());
    }

    #[test]
    fn flags_override_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("explicit.toml");
        std::fs::write(
            &path,
            "[general]\nconfirm_delete = false\n[tree]\nnavigation = \"hierarchical\"\n",
        )
        .expect("write");

        let flags = parse("[tree]\nnavigation = \"flat\"\n");
        let cfg = AppConfig::load(Some(&path), Some(&flags));
        assert_eq!(cfg.navigation(), NavigationMode::Flat);
        assert!(!cfg.confirm_delete());
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x/tree.json"), home.join("x").join("tree.json"));
        }
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    fn custom_palette_entries_are_optional() {
        let cfg = parse("[theme]\nscheme = \"custom\"\n[theme.custom]\ninput_fg = \"#e0af68\"\n");
        assert_eq!(cfg.theme_scheme(), "custom");
        let custom = cfg.theme.custom.expect("custom table");
        assert_eq!(custom.input_fg.as_deref(), Some("#e0af68"));
        assert!(custom.tree_fg.is_none());
    }
}
