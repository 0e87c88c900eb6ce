mod app;
mod bus;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod keymap;
mod logging;
mod theme;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, TreeConfig, WatcherConfig};
use crate::event::{Event, EventHandler};
use crate::fs::watcher::FsWatcher;
use crate::tui::{install_panic_hook, Tui};

/// Browse and manage directories as a tree.
#[derive(Parser, Debug)]
#[command(name = "dtree", version, about)]
struct Cli {
    /// Starting directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Navigation mode: flat or hierarchical
    #[arg(long)]
    navigation: Option<String>,

    /// File the known directories are saved to
    #[arg(long)]
    tree_file: Option<PathBuf>,

    /// Write a log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Make the listing follow the tree selection
    #[arg(long)]
    auto_chdir: bool,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,
}

impl Cli {
    /// Flags as a partial config layered over the config files.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                log_file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                ..Default::default()
            },
            tree: TreeConfig {
                navigation: self.navigation.clone(),
                auto_chdir: self.auto_chdir.then_some(true),
                tree_file: self
                    .tree_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                ..Default::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let path = cli.path.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", cli.path.display()))
    })?;

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    if let Some(log_file) = config.log_file() {
        logging::init(&log_file);
    }
    tracing::info!(path = %path.display(), "starting");

    install_panic_hook();

    let mouse_enabled = config.mouse_enabled();
    let mut tui = Tui::new(mouse_enabled)?;
    let mut app = App::new(&config, &path)?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    let _watcher = if config.watcher_enabled() {
        let ignore_patterns: Vec<String> = fs::watcher::DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        match FsWatcher::new(
            &path,
            Duration::from_millis(config.debounce_ms()),
            ignore_patterns,
            fs::watcher::DEFAULT_FLOOD_THRESHOLD,
            events.sender(),
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "filesystem watcher unavailable");
                None
            }
        }
    } else {
        None
    };

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        let event = events.next().await?;
        app.shell.input_pending = events.has_pending();
        match event {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) if mouse_enabled => handler::handle_mouse_event(&mut app, mouse),
            Event::Mouse(_) | Event::Tick | Event::Resize(_, _) => {}
            Event::FsChange(paths) => app.handle_fs_change(paths),
        }

        if app.shell.should_quit {
            break;
        }
    }

    tui.restore()?;
    drop(app);
    tracing::info!("exiting");
    Ok(())
}
