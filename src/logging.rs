use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "DTREE_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install a global subscriber writing to `log_file_path`.
///
/// The terminal belongs to the TUI, so log output never goes to stdout.
/// Returns `false` when the file cannot be created or a subscriber is
/// already installed; logging is simply disabled in that case.
pub fn init(log_file_path: &Path) -> bool {
    let log_file = match File::create(log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {}",
                log_file_path.display(),
                e
            );
            return false;
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Arc::new(log_file)).with_ansi(false))
        .with(build_filter(std::env::var(LOG_ENV).ok().as_deref()))
        .try_init()
        .is_ok()
}

/// Build the filter from user directives, falling back to `info`.
fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_falls_back_to_default() {
        assert_eq!(build_filter(None).to_string(), "info");
    }

    #[test]
    fn filter_uses_valid_directives() {
        let filter = build_filter(Some("dir_tree_tui=trace"));
        assert_eq!(filter.to_string(), "dir_tree_tui=trace");
    }

    #[test]
    fn init_reports_unwritable_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("dtree.log");
        assert!(!init(&path));
    }
}
